//! Create-from-source mapping
//!
//! Builds a new tender from a portal document. Every nested group is
//! independently optional and parse failures degrade per field: a malformed
//! delivery date leaves only that field unset, a malformed contract-document
//! date never blocks the deal id, amount, or url.

use chrono::Duration;

use tenderd_core::models::{Item, Tender};
use tenderd_source::dates::{parse_portal_date, parse_portal_datetime};
use tenderd_source::model::ParsedTender;

/// Days between an award's complaint period start and the qualification date.
pub const QUALIFICATION_OFFSET_DAYS: i64 = 4;

pub fn map_new_tender(owner_id: Option<i64>, tender_id: i64, parsed: &ParsedTender) -> Tender {
    let mut tender = Tender::new(tender_id, owner_id);

    tender.prozorro_number = parsed.prozorro_number.clone();
    tender.procedure_type = parsed.procedure_type.clone();
    tender.title = parsed.title.clone();
    tender.status_title = parsed.status_title.clone();

    if let Some(organizer) = &parsed.organizer {
        tender.organizer_name = organizer.name.clone();
        tender.organizer_usreou = organizer.usreou.clone();
        tender.organizer_address = organizer.address.clone();

        if let Some(contact) = &organizer.contact_person {
            tender.contact_person_name = contact.name.clone();
            tender.contact_person_phone = contact.phone.clone();
            tender.contact_person_email = contact.email.clone();
        }
    }

    if let Some(category) = &parsed.category {
        tender.category_id = category.id;
        tender.category_code = category.code.clone();
        tender.category_title = category.title.clone();
    }

    if let Some(budget) = &parsed.budget {
        tender.budget_amount = Some(budget.amount);
        tender.budget_amount_title = budget.amount_title.clone();
        tender.with_vat = Some(budget.with_vat);
        tender.vat_title = budget.vat_title.clone();
        tender.currency_title = budget.currency_title.clone();
        tender.currency_html_title = budget.currency_html_title.clone();
        tender.currency_id = Some(budget.currency_id);
    }

    tender.participant_cost = parsed.participation_cost;

    // Only the first nomenclature entry feeds the tender's own delivery
    // fields; all entries become line items below.
    if let Some(first) = parsed.nomenclatures.as_deref().and_then(|n| n.first()) {
        tender.delivery_address = first.delivery_address.clone();
        tender.delivery_period_to = first
            .delivery_period_to
            .as_deref()
            .and_then(parse_portal_date);
    }

    if let Some(award) = parsed.awards.as_deref().and_then(|a| a.first()) {
        tender.qualification_date = award
            .complaint_period_start
            .map(|start| start + Duration::days(QUALIFICATION_OFFSET_DAYS));
    }

    if let Some(contract) = parsed
        .participant_contracts
        .as_deref()
        .and_then(|pc| pc.first())
        .and_then(|pc| pc.contracts.as_deref())
        .and_then(|c| c.first())
    {
        tender.deal_amount = contract.amount;

        if let Some(document) = contract.documents.as_deref().and_then(|d| d.first()) {
            tender.deal_id = document.id.map(|id| id.to_string());
            tender.deal_date = document
                .date_modified
                .as_deref()
                .and_then(parse_portal_datetime);
            tender.deal_url = document.view_url.clone();
        }
    }

    if let Some(nomenclatures) = &parsed.nomenclatures {
        tender.items = nomenclatures
            .iter()
            .map(|n| Item {
                id: 0,
                tender_id,
                title: n.title.clone().unwrap_or_default(),
                count: n.count.clone(),
            })
            .collect();
    }

    if let Some(term) = parsed.payment_terms.as_deref().and_then(|t| t.first()) {
        tender.payment_terms_day = term.days;
    }

    if let Some(guarantee) = &parsed.guarantee {
        tender.guarantee_bank = guarantee.amount_title;
    }

    if let Some(dates) = &parsed.important_dates {
        tender.enquiry_period_start = dates
            .enquiry_period_start
            .as_deref()
            .and_then(parse_portal_datetime);
        tender.enquiry_period_end = dates
            .enquiry_period_end
            .as_deref()
            .and_then(parse_portal_datetime);
        tender.tendering_period_end = dates
            .tendering_period_end
            .as_deref()
            .and_then(parse_portal_datetime);
        tender.auction_start = dates
            .auction_start
            .as_deref()
            .and_then(parse_portal_datetime);
    }

    tender
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tenderd_source::model::{
        Award, Contract, ContractDocument, ContractStatus, ImportantDates, Nomenclature,
        Organizer, ParsedTender, ParticipantContract, PaymentTerm,
    };

    fn dt(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    #[test]
    fn empty_document_maps_to_blank_tender() {
        let tender = map_new_tender(Some(1), 500, &ParsedTender::default());
        assert_eq!(tender.id, 500);
        assert_eq!(tender.user_id, Some(1));
        assert!(tender.title.is_none());
        assert!(tender.items.is_empty());
        assert!(tender.qualification_date.is_none());
    }

    #[test]
    fn nomenclatures_become_items_and_first_feeds_delivery() {
        let parsed = ParsedTender {
            nomenclatures: Some(vec![
                Nomenclature {
                    title: Some("Томограф".to_string()),
                    count: Some("1".to_string()),
                    delivery_address: Some("Київ".to_string()),
                    delivery_period_to: Some("01.03.2024".to_string()),
                },
                Nomenclature {
                    title: Some("Монітор".to_string()),
                    count: Some("3".to_string()),
                    delivery_address: Some("Львів".to_string()),
                    delivery_period_to: Some("15.03.2024".to_string()),
                },
            ]),
            ..Default::default()
        };

        let tender = map_new_tender(None, 7, &parsed);
        assert_eq!(tender.items.len(), 2);
        assert_eq!(tender.items[1].title, "Монітор");
        assert_eq!(tender.delivery_address.as_deref(), Some("Київ"));
        assert_eq!(tender.delivery_period_to.unwrap().to_string(), "2024-03-01");
    }

    #[test]
    fn malformed_delivery_period_leaves_only_that_field_unset() {
        let parsed = ParsedTender {
            nomenclatures: Some(vec![Nomenclature {
                title: Some("Папір".to_string()),
                count: None,
                delivery_address: Some("Одеса".to_string()),
                delivery_period_to: Some("not-a-date".to_string()),
            }]),
            ..Default::default()
        };

        let tender = map_new_tender(None, 7, &parsed);
        assert_eq!(tender.delivery_address.as_deref(), Some("Одеса"));
        assert!(tender.delivery_period_to.is_none());
        assert_eq!(tender.items.len(), 1);
    }

    #[test]
    fn empty_awards_yield_no_qualification_date() {
        let parsed = ParsedTender {
            awards: Some(vec![]),
            ..Default::default()
        };
        let tender = map_new_tender(None, 7, &parsed);
        assert!(tender.qualification_date.is_none());
    }

    #[test]
    fn qualification_date_is_complaint_start_plus_four_days() {
        let parsed = ParsedTender {
            awards: Some(vec![Award {
                complaint_period_start: Some(dt("2024-01-01T00:00:00")),
                ..Default::default()
            }]),
            ..Default::default()
        };
        let tender = map_new_tender(None, 7, &parsed);
        assert_eq!(tender.qualification_date, Some(dt("2024-01-05T00:00:00")));
    }

    #[test]
    fn deal_date_parse_failure_keeps_id_amount_and_url() {
        let parsed = ParsedTender {
            participant_contracts: Some(vec![ParticipantContract {
                participant_title: Some("ТОВ Будінвест".to_string()),
                contracts: Some(vec![Contract {
                    status: Some(ContractStatus {
                        title: Some("Підписаний".to_string()),
                    }),
                    amount: Some(120000),
                    documents: Some(vec![ContractDocument {
                        id: Some(991),
                        date_modified: Some("garbage".to_string()),
                        view_url: Some("https://portal/doc/991".to_string()),
                    }]),
                }]),
            }]),
            ..Default::default()
        };

        let tender = map_new_tender(None, 7, &parsed);
        assert_eq!(tender.deal_id.as_deref(), Some("991"));
        assert!(tender.deal_date.is_none());
        assert_eq!(tender.deal_amount, Some(120000));
        assert_eq!(tender.deal_url.as_deref(), Some("https://portal/doc/991"));
    }

    #[test]
    fn contract_without_documents_still_maps_amount() {
        let parsed = ParsedTender {
            participant_contracts: Some(vec![ParticipantContract {
                participant_title: None,
                contracts: Some(vec![Contract {
                    status: None,
                    amount: Some(5000),
                    documents: None,
                }]),
            }]),
            ..Default::default()
        };

        let tender = map_new_tender(None, 7, &parsed);
        assert_eq!(tender.deal_amount, Some(5000));
        assert!(tender.deal_id.is_none());
        assert!(tender.deal_url.is_none());
    }

    #[test]
    fn optional_groups_map_independently() {
        let parsed = ParsedTender {
            organizer: Some(Organizer {
                name: Some("Міськрада".to_string()),
                usreou: Some("00012345".to_string()),
                address: None,
                contact_person: None,
            }),
            important_dates: Some(ImportantDates {
                enquiry_period_start: Some("15.01.2024 09:00".to_string()),
                enquiry_period_end: Some("broken".to_string()),
                tendering_period_end: None,
                auction_start: Some("01.02.2024 12:30".to_string()),
            }),
            payment_terms: Some(vec![PaymentTerm { days: Some(30) }]),
            ..Default::default()
        };

        let tender = map_new_tender(None, 7, &parsed);
        assert_eq!(tender.organizer_name.as_deref(), Some("Міськрада"));
        assert!(tender.contact_person_name.is_none());
        assert_eq!(
            tender.enquiry_period_start,
            Some(dt("2024-01-15T09:00:00"))
        );
        assert!(tender.enquiry_period_end.is_none());
        assert_eq!(tender.auction_start, Some(dt("2024-02-01T12:30:00")));
        assert_eq!(tender.payment_terms_day, Some(30));
    }
}
