//! Parsed tender document as served by the portal scraper.
//!
//! Field names mirror the portal's PascalCase JSON. Every nested group is
//! optional; consumers must tolerate any of them being absent.

use chrono::NaiveDateTime;
use serde::Deserialize;

/// Status title the portal assigns once offers have been reviewed; tenders in
/// this state with all deal fields filled need no further reconciliation.
pub const STATUS_OFFERS_REVIEWED: &str = "Пропозиції розглянуті";

/// Contract status title marking a signed deal.
pub const CONTRACT_STATUS_SIGNED: &str = "Підписаний";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedTender {
    #[serde(rename = "ProzorroNumber")]
    pub prozorro_number: Option<String>,
    #[serde(rename = "Organizer")]
    pub organizer: Option<Organizer>,
    #[serde(rename = "ProcedureType")]
    pub procedure_type: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Category")]
    pub category: Option<Category>,
    #[serde(rename = "StatusTitle")]
    pub status_title: Option<String>,
    #[serde(rename = "Budget")]
    pub budget: Option<Budget>,
    #[serde(rename = "ImportantDates")]
    pub important_dates: Option<ImportantDates>,
    #[serde(rename = "Nomenclatures")]
    pub nomenclatures: Option<Vec<Nomenclature>>,
    #[serde(rename = "ParticipationCostAmount")]
    pub participation_cost: Option<i64>,
    #[serde(rename = "PaymentTerms")]
    pub payment_terms: Option<Vec<PaymentTerm>>,
    #[serde(rename = "Guarantee")]
    pub guarantee: Option<Guarantee>,
    #[serde(rename = "ParticipantContracts")]
    pub participant_contracts: Option<Vec<ParticipantContract>>,
    #[serde(rename = "Awards")]
    pub awards: Option<Vec<Award>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Organizer {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Usreou")]
    pub usreou: Option<String>,
    #[serde(rename = "Address")]
    pub address: Option<String>,
    #[serde(rename = "ContactPerson")]
    pub contact_person: Option<ContactPerson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactPerson {
    #[serde(rename = "Name")]
    pub name: Option<String>,
    #[serde(rename = "Phone")]
    pub phone: Option<String>,
    #[serde(rename = "Email")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Category {
    #[serde(rename = "id")]
    pub id: Option<i32>,
    #[serde(rename = "code")]
    pub code: Option<String>,
    #[serde(rename = "title")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Budget {
    #[serde(rename = "Amount", default)]
    pub amount: f64,
    #[serde(rename = "AmountTitle")]
    pub amount_title: Option<String>,
    #[serde(rename = "WithVat", default)]
    pub with_vat: bool,
    #[serde(rename = "VatTitle")]
    pub vat_title: Option<String>,
    #[serde(rename = "CurrencyTitle")]
    pub currency_title: Option<String>,
    #[serde(rename = "CurrencyHtmlTitle")]
    pub currency_html_title: Option<String>,
    #[serde(rename = "CurrencyId", default)]
    pub currency_id: i32,
}

/// All four timestamps arrive as `dd.MM.yyyy HH:mm` strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportantDates {
    #[serde(rename = "EnquiryPeriodStart")]
    pub enquiry_period_start: Option<String>,
    #[serde(rename = "EnquiryPeriodEnd")]
    pub enquiry_period_end: Option<String>,
    #[serde(rename = "TenderingPeriodEnd")]
    pub tendering_period_end: Option<String>,
    #[serde(rename = "AuctionStart")]
    pub auction_start: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Nomenclature {
    /// `dd.MM.yyyy` date string.
    #[serde(rename = "DeliveryPeriodTo")]
    pub delivery_period_to: Option<String>,
    #[serde(rename = "DeliveryAddress")]
    pub delivery_address: Option<String>,
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Count")]
    pub count: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentTerm {
    #[serde(rename = "Days")]
    pub days: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Guarantee {
    #[serde(rename = "AmountTitle", default)]
    pub amount_title: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipantContract {
    #[serde(rename = "ParticipantTitle")]
    pub participant_title: Option<String>,
    #[serde(rename = "Contracts")]
    pub contracts: Option<Vec<Contract>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contract {
    #[serde(rename = "Status")]
    pub status: Option<ContractStatus>,
    #[serde(rename = "Amount")]
    pub amount: Option<i64>,
    #[serde(rename = "Documents")]
    pub documents: Option<Vec<ContractDocument>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractStatus {
    #[serde(rename = "Title")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContractDocument {
    #[serde(rename = "Id")]
    pub id: Option<i64>,
    /// `dd.MM.yyyy HH:mm` string.
    #[serde(rename = "DateModified")]
    pub date_modified: Option<String>,
    #[serde(rename = "ViewUrl")]
    pub view_url: Option<String>,
}

/// Unlike the rest of the document, the complaint period start is a typed
/// ISO date-time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Award {
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "ParticipantTitle")]
    pub participant_title: Option<String>,
    #[serde(rename = "ComplaintPeriodStart")]
    pub complaint_period_start: Option<NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_a_portal_document() {
        let json = r#"{
            "ProzorroNumber": "UA-2024-01-15-000001-a",
            "Title": "Медичне обладнання",
            "Organizer": {
                "Name": "Міська лікарня",
                "Usreou": "12345678",
                "Address": "Київ",
                "ContactPerson": {"Name": "Олена", "Phone": "+380501112233", "Email": "o@hospital.ua"}
            },
            "Category": {"id": 3, "code": "33100000-1", "title": "Медичне обладнання"},
            "StatusTitle": "Період уточнень",
            "Budget": {"Amount": 250000.5, "WithVat": true, "CurrencyId": 980},
            "ImportantDates": {"EnquiryPeriodStart": "15.01.2024 09:00", "AuctionStart": "01.02.2024 12:30"},
            "Nomenclatures": [
                {"Title": "Томограф", "Count": "1", "DeliveryPeriodTo": "01.03.2024", "DeliveryAddress": "Київ, вул. Лікарняна 1"}
            ],
            "PaymentTerms": [{"Days": 30}],
            "Awards": [{"ParticipantTitle": "ТОВ Постачальник", "ComplaintPeriodStart": "2024-02-05T00:00:00"}]
        }"#;

        let parsed: ParsedTender = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.prozorro_number.as_deref(), Some("UA-2024-01-15-000001-a"));
        let budget = parsed.budget.unwrap();
        assert_eq!(budget.amount, 250000.5);
        assert!(budget.with_vat);
        assert_eq!(budget.currency_id, 980);
        assert_eq!(
            parsed.nomenclatures.unwrap()[0].delivery_period_to.as_deref(),
            Some("01.03.2024")
        );
        let award = &parsed.awards.unwrap()[0];
        assert_eq!(
            award.complaint_period_start.unwrap().to_string(),
            "2024-02-05 00:00:00"
        );
    }

    #[test]
    fn missing_groups_deserialize_to_none() {
        let parsed: ParsedTender = serde_json::from_str("{}").unwrap();
        assert!(parsed.organizer.is_none());
        assert!(parsed.budget.is_none());
        assert!(parsed.awards.is_none());
    }
}
