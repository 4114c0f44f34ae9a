//! Partial-update merge types
//!
//! Patch structs enumerate every patchable scalar as an `Option`; `None`
//! (absent or explicit JSON null) never touches the target, `Some` overwrites
//! unconditionally. Nulling a stored value through a patch is therefore not
//! possible. Collections are excluded from the scalar merge by construction:
//! the progress list is a separate field the repository takes before calling
//! `apply_to`, and `apply_to` never reads it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use utoipa::ToSchema;

use super::tender::{ProgressStatus, Tender, TenderStage};
use super::user::{Role, User, UserStatus};

/// Incoming progress entry; the id is always generated on insert and the
/// parent tender is assigned by the repository.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntryInput {
    pub supplier: Option<String>,
    pub account_number: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub status: Option<ProgressStatus>,
}

/// Sparse tender update. Field names match the query-filter registry.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenderPatch {
    pub prozorro_number: Option<String>,
    pub title: Option<String>,
    pub unit: Option<String>,
    pub procedure_type: Option<String>,
    pub produce_type: Option<String>,

    pub organizer_name: Option<String>,
    pub organizer_usreou: Option<String>,
    pub organizer_address: Option<String>,
    pub contact_person_name: Option<String>,
    pub contact_person_phone: Option<String>,
    pub contact_person_email: Option<String>,

    pub category_id: Option<i32>,
    pub category_code: Option<String>,
    pub category_title: Option<String>,

    pub status_title: Option<String>,
    pub participants_offer_status: Option<String>,
    pub internal_stage: Option<String>,

    pub budget_amount: Option<f64>,
    pub budget_amount_title: Option<String>,
    pub with_vat: Option<bool>,
    pub vat_title: Option<String>,
    pub currency_title: Option<String>,
    pub currency_html_title: Option<String>,
    pub currency_id: Option<i32>,

    pub guarantee_bank: Option<bool>,
    pub participant_cost: Option<i64>,

    pub enquiry_period_start: Option<NaiveDateTime>,
    pub enquiry_period_end: Option<NaiveDateTime>,
    pub tendering_period_end: Option<NaiveDateTime>,
    pub auction_start: Option<NaiveDateTime>,
    pub qualification_date: Option<NaiveDateTime>,

    pub deal_id: Option<String>,
    pub deal_date: Option<NaiveDateTime>,
    pub deal_amount: Option<i64>,
    pub deal_url: Option<String>,

    pub amount_by_accounts: Option<i64>,
    pub delivery_terms_upon_request: Option<bool>,
    pub delivery_period_to: Option<NaiveDate>,
    pub payment_terms_day: Option<i32>,
    pub delivery_address: Option<String>,

    pub cost: Option<i32>,
    pub commentary: Option<String>,
    pub stage: Option<TenderStage>,

    /// Full replacement of the progress collection; the repository takes this
    /// before the scalar merge runs.
    pub progress: Option<Vec<ProgressEntryInput>>,
}

impl TenderPatch {
    /// Detach the progress replacement so the scalar merge cannot see it.
    pub fn take_progress(&mut self) -> Option<Vec<ProgressEntryInput>> {
        self.progress.take()
    }

    /// Overwrite every `Some` scalar onto the target; `None` leaves the
    /// stored value untouched. Ownership links and children are never merged
    /// here.
    pub fn apply_to(self, target: &mut Tender) {
        let TenderPatch {
            prozorro_number,
            title,
            unit,
            procedure_type,
            produce_type,
            organizer_name,
            organizer_usreou,
            organizer_address,
            contact_person_name,
            contact_person_phone,
            contact_person_email,
            category_id,
            category_code,
            category_title,
            status_title,
            participants_offer_status,
            internal_stage,
            budget_amount,
            budget_amount_title,
            with_vat,
            vat_title,
            currency_title,
            currency_html_title,
            currency_id,
            guarantee_bank,
            participant_cost,
            enquiry_period_start,
            enquiry_period_end,
            tendering_period_end,
            auction_start,
            qualification_date,
            deal_id,
            deal_date,
            deal_amount,
            deal_url,
            amount_by_accounts,
            delivery_terms_upon_request,
            delivery_period_to,
            payment_terms_day,
            delivery_address,
            cost,
            commentary,
            stage,
            progress: _,
        } = self;

        merge(&mut target.prozorro_number, prozorro_number);
        merge(&mut target.title, title);
        merge(&mut target.unit, unit);
        merge(&mut target.procedure_type, procedure_type);
        merge(&mut target.produce_type, produce_type);
        merge(&mut target.organizer_name, organizer_name);
        merge(&mut target.organizer_usreou, organizer_usreou);
        merge(&mut target.organizer_address, organizer_address);
        merge(&mut target.contact_person_name, contact_person_name);
        merge(&mut target.contact_person_phone, contact_person_phone);
        merge(&mut target.contact_person_email, contact_person_email);
        merge(&mut target.category_id, category_id);
        merge(&mut target.category_code, category_code);
        merge(&mut target.category_title, category_title);
        merge(&mut target.status_title, status_title);
        merge(
            &mut target.participants_offer_status,
            participants_offer_status,
        );
        merge(&mut target.internal_stage, internal_stage);
        merge(&mut target.budget_amount, budget_amount);
        merge(&mut target.budget_amount_title, budget_amount_title);
        merge(&mut target.with_vat, with_vat);
        merge(&mut target.vat_title, vat_title);
        merge(&mut target.currency_title, currency_title);
        merge(&mut target.currency_html_title, currency_html_title);
        merge(&mut target.currency_id, currency_id);
        if let Some(v) = guarantee_bank {
            target.guarantee_bank = v;
        }
        merge(&mut target.participant_cost, participant_cost);
        merge(&mut target.enquiry_period_start, enquiry_period_start);
        merge(&mut target.enquiry_period_end, enquiry_period_end);
        merge(&mut target.tendering_period_end, tendering_period_end);
        merge(&mut target.auction_start, auction_start);
        merge(&mut target.qualification_date, qualification_date);
        merge(&mut target.deal_id, deal_id);
        merge(&mut target.deal_date, deal_date);
        merge(&mut target.deal_amount, deal_amount);
        merge(&mut target.deal_url, deal_url);
        merge(&mut target.amount_by_accounts, amount_by_accounts);
        if let Some(v) = delivery_terms_upon_request {
            target.delivery_terms_upon_request = v;
        }
        merge(&mut target.delivery_period_to, delivery_period_to);
        merge(&mut target.payment_terms_day, payment_terms_day);
        merge(&mut target.delivery_address, delivery_address);
        merge(&mut target.cost, cost);
        merge(&mut target.commentary, commentary);
        if let Some(v) = stage {
            target.stage = v;
        }
    }
}

/// Sparse user update. Password and roles are intentionally not applied by
/// `apply_to`: the password must be re-hashed by the caller, and role changes
/// go through the admin protection rules.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub status: Option<UserStatus>,
    pub roles: Option<Vec<Role>>,
}

impl UserPatch {
    pub fn apply_to(&self, target: &mut User) {
        if let Some(v) = &self.name {
            target.name = v.clone();
        }
        if let Some(v) = &self.surname {
            target.surname = v.clone();
        }
        if let Some(v) = &self.email {
            target.email = v.clone();
        }
        if let Some(v) = &self.username {
            target.username = v.clone();
        }
        if let Some(v) = self.status {
            target.status = Some(v);
        }
    }
}

fn merge<T>(target: &mut Option<T>, patch: Option<T>) {
    if let Some(v) = patch {
        *target = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_patch_fields_never_overwrite() {
        let mut tender = Tender::new(100, Some(1));
        tender.title = Some("A".to_string());
        tender.unit = Some("kg".to_string());

        let patch = TenderPatch {
            unit: Some("pcs".to_string()),
            ..Default::default()
        };
        patch.apply_to(&mut tender);

        assert_eq!(tender.title.as_deref(), Some("A"));
        assert_eq!(tender.unit.as_deref(), Some("pcs"));
    }

    #[test]
    fn scalar_merge_ignores_progress_and_ownership() {
        let mut tender = Tender::new(100, Some(1));
        tender.supplier_id = Some(7);

        let mut patch = TenderPatch {
            commentary: Some("checked".to_string()),
            progress: Some(vec![ProgressEntryInput {
                supplier: Some("ACME".to_string()),
                account_number: None,
                date: None,
                status: Some(ProgressStatus::InvoiceRequested),
            }]),
            ..Default::default()
        };

        let taken = patch.take_progress();
        assert_eq!(taken.as_ref().map(Vec::len), Some(1));

        patch.apply_to(&mut tender);
        assert_eq!(tender.commentary.as_deref(), Some("checked"));
        assert!(tender.progress.is_empty());
        assert_eq!(tender.supplier_id, Some(7));
        assert_eq!(tender.user_id, Some(1));
    }

    #[test]
    fn stage_and_flags_overwrite_when_present() {
        let mut tender = Tender::new(100, None);
        let patch = TenderPatch {
            stage: Some(TenderStage::Won),
            guarantee_bank: Some(true),
            ..Default::default()
        };
        patch.apply_to(&mut tender);
        assert_eq!(tender.stage, TenderStage::Won);
        assert!(tender.guarantee_bank);
    }

    #[test]
    fn user_patch_skips_password_and_roles() {
        let mut user = User {
            id: 1,
            name: "Ann".to_string(),
            surname: "Smith".to_string(),
            email: "ann@example.com".to_string(),
            username: "ann".to_string(),
            password_hash: "$2b$old".to_string(),
            created_at: chrono::NaiveDateTime::default(),
            status: Some(UserStatus::Active),
            roles: vec![Role::User],
        };

        let patch = UserPatch {
            surname: Some("Kovalenko".to_string()),
            password: Some("new-secret".to_string()),
            roles: Some(vec![Role::Admin]),
            ..Default::default()
        };
        patch.apply_to(&mut user);

        assert_eq!(user.surname, "Kovalenko");
        assert_eq!(user.password_hash, "$2b$old");
        assert_eq!(user.roles, vec![Role::User]);
    }
}
