use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::file::StoredFile;

/// Local workflow stage. Maintained by users, never sourced from the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tender_stage", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TenderStage {
    Created,
    InProgress,
    Submitted,
    Won,
    Lost,
    Closed,
}

/// Invoice/delivery progress status for a tender's progress entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "progress_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InvoiceRequested,
    InvoiceReceived,
    InvoicePaid,
    OrderPlaced,
    GoodsReceived,
}

/// A procurement tender mirrored from the portal and enriched locally.
///
/// The id is the portal's tender id, never generated locally. Deal fields
/// (`deal_id`, `deal_date`, `deal_amount`, `deal_url`) are fill-only once set;
/// reconciliation only writes them when they are null.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub id: i64,
    pub created_at: NaiveDateTime,

    pub user_id: Option<i64>,
    pub supplier_id: Option<i64>,
    pub tenderer_id: Option<i64>,
    pub participant_id: Option<i64>,

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

    pub guarantee_bank: bool,
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
    pub delivery_terms_upon_request: bool,
    pub delivery_period_to: Option<NaiveDate>,
    pub payment_terms_day: Option<i32>,
    pub delivery_address: Option<String>,

    pub cost: Option<i32>,
    pub commentary: Option<String>,
    pub stage: TenderStage,

    #[sqlx(skip)]
    pub items: Vec<Item>,
    #[sqlx(skip)]
    pub progress: Vec<ProgressEntry>,
    #[sqlx(skip)]
    pub files: Vec<StoredFile>,
}

impl Tender {
    /// Blank tender with the portal id and owner set. `created_at` is
    /// overwritten by the database on insert.
    pub fn new(id: i64, user_id: Option<i64>) -> Self {
        Self {
            id,
            created_at: NaiveDateTime::default(),
            user_id,
            supplier_id: None,
            tenderer_id: None,
            participant_id: None,
            prozorro_number: None,
            title: None,
            unit: None,
            procedure_type: None,
            produce_type: None,
            organizer_name: None,
            organizer_usreou: None,
            organizer_address: None,
            contact_person_name: None,
            contact_person_phone: None,
            contact_person_email: None,
            category_id: None,
            category_code: None,
            category_title: None,
            status_title: None,
            participants_offer_status: None,
            internal_stage: None,
            budget_amount: None,
            budget_amount_title: None,
            with_vat: None,
            vat_title: None,
            currency_title: None,
            currency_html_title: None,
            currency_id: None,
            guarantee_bank: false,
            participant_cost: None,
            enquiry_period_start: None,
            enquiry_period_end: None,
            tendering_period_end: None,
            auction_start: None,
            qualification_date: None,
            deal_id: None,
            deal_date: None,
            deal_amount: None,
            deal_url: None,
            amount_by_accounts: None,
            delivery_terms_upon_request: false,
            delivery_period_to: None,
            payment_terms_day: None,
            delivery_address: None,
            cost: None,
            commentary: None,
            stage: TenderStage::Created,
            items: Vec::new(),
            progress: Vec::new(),
            files: Vec::new(),
        }
    }
}

/// A line item of a tender. Created only during ingestion from the portal's
/// nomenclature list.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub tender_id: i64,
    pub title: String,
    /// Quantity as free text, exactly as the portal sends it.
    pub count: Option<String>,
}

/// Invoice/delivery progress record. The whole collection is replaced on
/// patch, entries are never merged individually.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntry {
    #[serde(skip_serializing)]
    pub id: i64,
    #[serde(skip_serializing)]
    pub tender_id: i64,
    pub supplier: Option<String>,
    pub account_number: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub status: Option<ProgressStatus>,
}
