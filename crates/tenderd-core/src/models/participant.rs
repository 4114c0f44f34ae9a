use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "company_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CompanyType {
    Llc,
    SoleProprietor,
}

/// A reference company assignable to a tender's participant slot.
/// Independently managed, referenced by id, not owned by any tender.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: i64,
    pub company_type: Option<CompanyType>,
    pub name: Option<String>,
}
