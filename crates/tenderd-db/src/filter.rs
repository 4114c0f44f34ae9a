//! Dynamic query filter builder
//!
//! Translates ad-hoc request parameters into AND-composed predicates on a
//! `sqlx::QueryBuilder`. Field resolution goes through a static per-entity
//! registry instead of runtime type inspection: every filterable parameter
//! name maps to a column and a `FieldKind` deciding how its value is parsed
//! and compared.
//!
//! Malformed input degrades per field, never per request: unknown names and
//! unparsable values contribute no predicate. Filter UIs send whatever the
//! user typed; one bad parameter must not fail the whole listing.

use std::collections::{BTreeMap, HashMap};

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Postgres, QueryBuilder};

use tenderd_core::AppError;

/// Semantic type of a filterable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Case-sensitive prefix match.
    Text,
    /// i32 column, equality.
    Int,
    /// i64 column, equality.
    BigInt,
    /// f64 column, equality.
    Float,
    /// Literal `true` (any case) matches true, anything else matches false.
    Boolean,
    /// Range-only; a plain value contributes no predicate.
    Date,
    /// Range-only; a plain value contributes no predicate.
    DateTime,
    /// Foreign key to a related entity, matched by parsed-id equality.
    Relation,
}

pub struct FieldDef {
    pub param: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

const fn field(param: &'static str, column: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { param, column, kind }
}

/// Filterable tender fields, keyed by the request parameter names the API has
/// always exposed.
pub const TENDER_FIELDS: &[FieldDef] = &[
    field("id", "id", FieldKind::BigInt),
    field("createdAt", "created_at", FieldKind::DateTime),
    field("userId", "user_id", FieldKind::Relation),
    field("supplierId", "supplier_id", FieldKind::Relation),
    field("tendererId", "tenderer_id", FieldKind::Relation),
    field("prozorroNumber", "prozorro_number", FieldKind::Text),
    field("title", "title", FieldKind::Text),
    field("unit", "unit", FieldKind::Text),
    field("procedureType", "procedure_type", FieldKind::Text),
    field("produceType", "produce_type", FieldKind::Text),
    field("organizerName", "organizer_name", FieldKind::Text),
    field("organizerUsreou", "organizer_usreou", FieldKind::Text),
    field("organizerAddress", "organizer_address", FieldKind::Text),
    field("contactPersonName", "contact_person_name", FieldKind::Text),
    field("contactPersonPhone", "contact_person_phone", FieldKind::Text),
    field("contactPersonEmail", "contact_person_email", FieldKind::Text),
    field("categoryId", "category_id", FieldKind::Int),
    field("categoryCode", "category_code", FieldKind::Text),
    field("categoryTitle", "category_title", FieldKind::Text),
    field("statusTitle", "status_title", FieldKind::Text),
    field(
        "participantsOfferStatus",
        "participants_offer_status",
        FieldKind::Text,
    ),
    field("internalStage", "internal_stage", FieldKind::Text),
    field("budgetAmount", "budget_amount", FieldKind::Float),
    field("budgetAmountTitle", "budget_amount_title", FieldKind::Text),
    field("withVat", "with_vat", FieldKind::Boolean),
    field("vatTitle", "vat_title", FieldKind::Text),
    field("currencyTitle", "currency_title", FieldKind::Text),
    field("currencyHtmlTitle", "currency_html_title", FieldKind::Text),
    field("currencyId", "currency_id", FieldKind::Int),
    field("guaranteeBank", "guarantee_bank", FieldKind::Boolean),
    field("participantCost", "participant_cost", FieldKind::BigInt),
    field("enquiryPeriodStart", "enquiry_period_start", FieldKind::DateTime),
    field("enquiryPeriodEnd", "enquiry_period_end", FieldKind::DateTime),
    field("tenderingPeriodEnd", "tendering_period_end", FieldKind::DateTime),
    field("auctionStart", "auction_start", FieldKind::DateTime),
    field("qualificationDate", "qualification_date", FieldKind::DateTime),
    field("dealId", "deal_id", FieldKind::Text),
    field("dealDate", "deal_date", FieldKind::DateTime),
    field("dealAmount", "deal_amount", FieldKind::BigInt),
    field("dealUrl", "deal_url", FieldKind::Text),
    field("amountByAccounts", "amount_by_accounts", FieldKind::BigInt),
    field(
        "deliveryTermsUponRequest",
        "delivery_terms_upon_request",
        FieldKind::Boolean,
    ),
    field("deliveryPeriodTo", "delivery_period_to", FieldKind::Date),
    field("paymentTermsDay", "payment_terms_day", FieldKind::Int),
    field("deliveryAddress", "delivery_address", FieldKind::Text),
    field("cost", "cost", FieldKind::Int),
    field("commentary", "commentary", FieldKind::Text),
];

/// Filterable user fields. The password hash is deliberately absent.
pub const USER_FIELDS: &[FieldDef] = &[
    field("id", "id", FieldKind::BigInt),
    field("name", "name", FieldKind::Text),
    field("surname", "surname", FieldKind::Text),
    field("email", "email", FieldKind::Text),
    field("username", "username", FieldKind::Text),
];

fn lookup<'a>(registry: &'a [FieldDef], param: &str) -> Option<&'a FieldDef> {
    registry.iter().find(|f| f.param == param)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `asc` in any case sorts ascending, anything else descending.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Pagination and ordering for listing endpoints.
#[derive(Debug, Clone)]
pub struct ListParams {
    pub page_number: i64,
    pub page_size: i64,
    pub sort_by: String,
    pub sort_direction: SortDirection,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page_number: 0,
            page_size: 10,
            sort_by: "id".to_string(),
            sort_direction: SortDirection::Desc,
        }
    }
}

/// Append every parseable filter as an `AND` predicate.
///
/// Parameters are partitioned into `_start`/`_stop` range pairs and simple
/// values first; a field present in both forms yields only the range
/// predicate. Clauses are emitted in parameter-name order so the generated
/// SQL is deterministic.
pub fn apply_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    registry: &[FieldDef],
    params: &HashMap<String, String>,
) {
    let mut simple: BTreeMap<&str, &str> = BTreeMap::new();
    let mut ranges: BTreeMap<&str, (Option<&str>, Option<&str>)> = BTreeMap::new();

    for (key, value) in params {
        if let Some(base) = key.strip_suffix("_start") {
            ranges.entry(base).or_default().0 = Some(value.as_str());
        } else if let Some(base) = key.strip_suffix("_stop") {
            ranges.entry(base).or_default().1 = Some(value.as_str());
        } else {
            simple.insert(key.as_str(), value.as_str());
        }
    }

    for (param, value) in &simple {
        if ranges.contains_key(param) {
            continue;
        }
        push_simple(qb, registry, param, value);
    }

    for (param, (start, stop)) in &ranges {
        push_range(qb, registry, param, *start, *stop);
    }
}

fn push_simple(
    qb: &mut QueryBuilder<'_, Postgres>,
    registry: &[FieldDef],
    param: &str,
    value: &str,
) {
    let Some(def) = lookup(registry, param) else {
        return;
    };

    match def.kind {
        FieldKind::Text => {
            qb.push(" AND ")
                .push(def.column)
                .push(" LIKE ")
                .push_bind(prefix_pattern(value));
        }
        FieldKind::Int => {
            if let Ok(v) = value.parse::<i32>() {
                qb.push(" AND ").push(def.column).push(" = ").push_bind(v);
            }
        }
        FieldKind::BigInt | FieldKind::Relation => {
            if let Ok(v) = value.parse::<i64>() {
                qb.push(" AND ").push(def.column).push(" = ").push_bind(v);
            }
        }
        FieldKind::Float => {
            if let Ok(v) = value.parse::<f64>() {
                qb.push(" AND ").push(def.column).push(" = ").push_bind(v);
            }
        }
        FieldKind::Boolean => {
            let v = value.eq_ignore_ascii_case("true");
            qb.push(" AND ").push(def.column).push(" = ").push_bind(v);
        }
        // Date-valued fields are range-only; a plain value is ignored.
        FieldKind::Date | FieldKind::DateTime => {}
    }
}

fn push_range(
    qb: &mut QueryBuilder<'_, Postgres>,
    registry: &[FieldDef],
    param: &str,
    start: Option<&str>,
    stop: Option<&str>,
) {
    let Some(def) = lookup(registry, param) else {
        return;
    };

    // A present-but-unparsable bound drops the whole field, matching the
    // tolerance of the simple filters.
    match def.kind {
        FieldKind::Int => {
            let (Ok(start), Ok(stop)) = (parse_bound::<i32>(start), parse_bound::<i32>(stop))
            else {
                return;
            };
            push_range_clause(qb, def.column, start, stop);
        }
        FieldKind::BigInt => {
            let (Ok(start), Ok(stop)) = (parse_bound::<i64>(start), parse_bound::<i64>(stop))
            else {
                return;
            };
            push_range_clause(qb, def.column, start, stop);
        }
        FieldKind::Float => {
            let (Ok(start), Ok(stop)) = (parse_bound::<f64>(start), parse_bound::<f64>(stop))
            else {
                return;
            };
            push_range_clause(qb, def.column, start, stop);
        }
        FieldKind::Date => {
            let (Some(start), Some(stop)) = (
                parse_date_bound(start),
                parse_date_bound(stop),
            ) else {
                return;
            };
            push_range_clause(qb, def.column, start, stop);
        }
        FieldKind::DateTime => {
            let (Some(start), Some(stop)) = (
                parse_datetime_bound(start),
                parse_datetime_bound(stop),
            ) else {
                return;
            };
            push_range_clause(qb, def.column, start, stop);
        }
        FieldKind::Text | FieldKind::Boolean | FieldKind::Relation => {}
    }
}

fn push_range_clause<'args, T>(
    qb: &mut QueryBuilder<'args, Postgres>,
    column: &str,
    start: Option<T>,
    stop: Option<T>,
) where
    T: sqlx::Encode<'args, Postgres> + sqlx::Type<Postgres> + Send + 'args,
{
    match (start, stop) {
        (Some(start), Some(stop)) => {
            qb.push(" AND ")
                .push(column)
                .push(" BETWEEN ")
                .push_bind(start)
                .push(" AND ")
                .push_bind(stop);
        }
        (Some(start), None) => {
            qb.push(" AND ").push(column).push(" >= ").push_bind(start);
        }
        (None, Some(stop)) => {
            qb.push(" AND ").push(column).push(" <= ").push_bind(stop);
        }
        (None, None) => {}
    }
}

/// Missing bound is fine (`Ok(None)`); a present bound must parse.
fn parse_bound<T: std::str::FromStr>(value: Option<&str>) -> Result<Option<T>, ()> {
    match value {
        None => Ok(None),
        Some(v) => v.parse::<T>().map(Some).map_err(|_| ()),
    }
}

/// `Some(None)` = bound absent, `Some(Some(_))` = parsed, `None` = unparsable.
fn parse_date_bound(value: Option<&str>) -> Option<Option<NaiveDate>> {
    match value {
        None => Some(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d").ok().map(Some),
    }
}

fn parse_datetime_bound(value: Option<&str>) -> Option<Option<NaiveDateTime>> {
    match value {
        None => Some(None),
        Some(v) => parse_iso_datetime(v).map(Some),
    }
}

/// ISO date-time with optional seconds. A date-only string (10 characters)
/// is treated as midnight of that day.
fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    let normalized = if value.len() == 10 {
        format!("{value}T00:00:00")
    } else {
        value.to_string()
    };
    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M"))
        .ok()
}

fn prefix_pattern(value: &str) -> String {
    format!("{value}%")
}

/// Resolve an `ORDER BY` column through the registry. Unlike filters, an
/// unknown sort field is an error: the column name is spliced into the SQL
/// text, so it must come from the registry.
pub fn resolve_sort(registry: &[FieldDef], sort_by: &str) -> Result<&'static str, AppError> {
    lookup(registry, sort_by)
        .map(|def| def.column)
        .ok_or_else(|| AppError::InvalidArgument(format!("Unknown sort field: {sort_by}")))
}

/// Append `ORDER BY .. LIMIT .. OFFSET ..` for a page of results.
pub fn push_order_and_page(
    qb: &mut QueryBuilder<'_, Postgres>,
    registry: &[FieldDef],
    params: &ListParams,
) -> Result<(), AppError> {
    let column = resolve_sort(registry, &params.sort_by)?;
    let size = params.page_size.max(1);
    let offset = params.page_number.max(0) * size;

    qb.push(" ORDER BY ")
        .push(column)
        .push(" ")
        .push(params.sort_direction.as_sql())
        .push(" LIMIT ")
        .push_bind(size)
        .push(" OFFSET ")
        .push_bind(offset);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(params: &[(&str, &str)]) -> String {
        let map: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut qb = QueryBuilder::new("SELECT * FROM tenders WHERE 1=1");
        apply_filters(&mut qb, TENDER_FIELDS, &map);
        qb.sql().to_string()
    }

    const BASE: &str = "SELECT * FROM tenders WHERE 1=1";

    #[test]
    fn text_fields_filter_by_prefix() {
        let sql = build(&[("title", "Медичні")]);
        assert_eq!(sql, format!("{BASE} AND title LIKE $1"));
        assert_eq!(prefix_pattern("ab"), "ab%");
    }

    #[test]
    fn unparsable_numeric_value_is_skipped() {
        let sql = build(&[("budgetAmount", "notanumber")]);
        assert_eq!(sql, BASE);
    }

    #[test]
    fn parsable_numeric_value_matches_by_equality() {
        let sql = build(&[("budgetAmount", "100.5")]);
        assert_eq!(sql, format!("{BASE} AND budget_amount = $1"));
    }

    #[test]
    fn unknown_field_is_skipped() {
        let sql = build(&[("noSuchField", "x")]);
        assert_eq!(sql, BASE);
    }

    #[test]
    fn boolean_accepts_any_case_and_defaults_to_false() {
        assert_eq!(
            build(&[("withVat", "TRUE")]),
            format!("{BASE} AND with_vat = $1")
        );
        // non-"true" still constrains, to false
        assert_eq!(
            build(&[("withVat", "yes")]),
            format!("{BASE} AND with_vat = $1")
        );
    }

    #[test]
    fn relation_fields_match_related_id() {
        assert_eq!(
            build(&[("userId", "5")]),
            format!("{BASE} AND user_id = $1")
        );
        assert_eq!(build(&[("userId", "abc")]), BASE);
    }

    #[test]
    fn plain_value_on_date_field_is_ignored() {
        assert_eq!(build(&[("auctionStart", "2024-01-01T00:00:00")]), BASE);
    }

    #[test]
    fn range_with_both_bounds_is_inclusive_between() {
        let sql = build(&[
            ("budgetAmount_start", "10"),
            ("budgetAmount_stop", "20"),
        ]);
        assert_eq!(sql, format!("{BASE} AND budget_amount BETWEEN $1 AND $2"));
    }

    #[test]
    fn single_bound_ranges_use_inclusive_comparisons() {
        assert_eq!(
            build(&[("participantCost_start", "100")]),
            format!("{BASE} AND participant_cost >= $1")
        );
        assert_eq!(
            build(&[("participantCost_stop", "900")]),
            format!("{BASE} AND participant_cost <= $1")
        );
    }

    #[test]
    fn unparsable_bound_drops_the_whole_field() {
        let sql = build(&[
            ("budgetAmount_start", "oops"),
            ("budgetAmount_stop", "20"),
        ]);
        assert_eq!(sql, BASE);
    }

    #[test]
    fn date_only_string_is_midnight_for_datetime_fields() {
        let sql = build(&[("auctionStart_start", "2024-01-01")]);
        assert_eq!(sql, format!("{BASE} AND auction_start >= $1"));
        assert_eq!(
            parse_iso_datetime("2024-01-01").unwrap().to_string(),
            "2024-01-01 00:00:00"
        );
    }

    #[test]
    fn range_wins_over_simple_for_the_same_field() {
        let sql = build(&[
            ("dealAmount", "5"),
            ("dealAmount_start", "1"),
            ("dealAmount_stop", "9"),
        ]);
        assert_eq!(sql, format!("{BASE} AND deal_amount BETWEEN $1 AND $2"));
    }

    #[test]
    fn clauses_compose_with_and_in_name_order() {
        let sql = build(&[("unit", "kg"), ("categoryId", "3")]);
        assert_eq!(
            sql,
            format!("{BASE} AND category_id = $1 AND unit LIKE $2")
        );
    }

    #[test]
    fn date_range_on_date_field_uses_plain_dates() {
        let sql = build(&[
            ("deliveryPeriodTo_start", "2024-01-01"),
            ("deliveryPeriodTo_stop", "2024-06-30"),
        ]);
        assert_eq!(
            sql,
            format!("{BASE} AND delivery_period_to BETWEEN $1 AND $2")
        );
    }

    #[test]
    fn sort_resolves_through_registry() {
        assert_eq!(resolve_sort(TENDER_FIELDS, "budgetAmount").unwrap(), "budget_amount");
        assert!(resolve_sort(TENDER_FIELDS, "1; DROP TABLE tenders").is_err());
    }

    #[test]
    fn user_registry_excludes_password() {
        assert!(lookup(USER_FIELDS, "password").is_none());
        let map = HashMap::from([("password".to_string(), "x".to_string())]);
        let mut qb = QueryBuilder::new("SELECT * FROM users WHERE 1=1");
        apply_filters(&mut qb, USER_FIELDS, &map);
        assert_eq!(qb.sql(), "SELECT * FROM users WHERE 1=1");
    }

    #[test]
    fn pagination_appends_order_limit_offset() {
        let mut qb = QueryBuilder::new(BASE);
        let params = ListParams {
            page_number: 2,
            page_size: 10,
            sort_by: "createdAt".to_string(),
            sort_direction: SortDirection::Asc,
        };
        push_order_and_page(&mut qb, TENDER_FIELDS, &params).unwrap();
        assert_eq!(
            qb.sql(),
            format!("{BASE} ORDER BY created_at ASC LIMIT $1 OFFSET $2")
        );
    }
}
