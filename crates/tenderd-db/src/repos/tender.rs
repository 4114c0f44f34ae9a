use std::collections::HashMap;

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use tenderd_core::models::{Item, ProgressEntry, ProgressEntryInput, StoredFile, Tender};
use tenderd_core::AppError;

use crate::filter::{apply_filters, push_order_and_page, ListParams, TENDER_FIELDS};

const INSERT_TENDER: &str = r#"
INSERT INTO tenders (
    id, user_id, supplier_id, tenderer_id, participant_id,
    prozorro_number, title, unit, procedure_type, produce_type,
    organizer_name, organizer_usreou, organizer_address,
    contact_person_name, contact_person_phone, contact_person_email,
    category_id, category_code, category_title,
    status_title, participants_offer_status, internal_stage,
    budget_amount, budget_amount_title, with_vat, vat_title,
    currency_title, currency_html_title, currency_id,
    guarantee_bank, participant_cost,
    enquiry_period_start, enquiry_period_end, tendering_period_end,
    auction_start, qualification_date,
    deal_id, deal_date, deal_amount, deal_url,
    amount_by_accounts, delivery_terms_upon_request, delivery_period_to,
    payment_terms_day, delivery_address, cost, commentary, stage
) VALUES (
    $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
    $11, $12, $13, $14, $15, $16, $17, $18, $19, $20,
    $21, $22, $23, $24, $25, $26, $27, $28, $29, $30,
    $31, $32, $33, $34, $35, $36, $37, $38, $39, $40,
    $41, $42, $43, $44, $45, $46, $47, $48
) RETURNING *
"#;

// Binds in the same order as INSERT_TENDER: the id is $1 in both statements.
const UPDATE_TENDER: &str = r#"
UPDATE tenders SET
    user_id = $2, supplier_id = $3, tenderer_id = $4, participant_id = $5,
    prozorro_number = $6, title = $7, unit = $8, procedure_type = $9,
    produce_type = $10, organizer_name = $11, organizer_usreou = $12,
    organizer_address = $13, contact_person_name = $14,
    contact_person_phone = $15, contact_person_email = $16,
    category_id = $17, category_code = $18, category_title = $19,
    status_title = $20, participants_offer_status = $21, internal_stage = $22,
    budget_amount = $23, budget_amount_title = $24, with_vat = $25,
    vat_title = $26, currency_title = $27, currency_html_title = $28,
    currency_id = $29, guarantee_bank = $30, participant_cost = $31,
    enquiry_period_start = $32, enquiry_period_end = $33,
    tendering_period_end = $34, auction_start = $35, qualification_date = $36,
    deal_id = $37, deal_date = $38, deal_amount = $39, deal_url = $40,
    amount_by_accounts = $41, delivery_terms_upon_request = $42,
    delivery_period_to = $43, payment_terms_day = $44, delivery_address = $45,
    cost = $46, commentary = $47, stage = $48
WHERE id = $1
RETURNING *
"#;

/// Bind every tender column in the shared statement order (id first).
macro_rules! bind_tender_values {
    ($query:expr, $t:expr) => {
        $query
            .bind($t.id)
            .bind($t.user_id)
            .bind($t.supplier_id)
            .bind($t.tenderer_id)
            .bind($t.participant_id)
            .bind(&$t.prozorro_number)
            .bind(&$t.title)
            .bind(&$t.unit)
            .bind(&$t.procedure_type)
            .bind(&$t.produce_type)
            .bind(&$t.organizer_name)
            .bind(&$t.organizer_usreou)
            .bind(&$t.organizer_address)
            .bind(&$t.contact_person_name)
            .bind(&$t.contact_person_phone)
            .bind(&$t.contact_person_email)
            .bind($t.category_id)
            .bind(&$t.category_code)
            .bind(&$t.category_title)
            .bind(&$t.status_title)
            .bind(&$t.participants_offer_status)
            .bind(&$t.internal_stage)
            .bind($t.budget_amount)
            .bind(&$t.budget_amount_title)
            .bind($t.with_vat)
            .bind(&$t.vat_title)
            .bind(&$t.currency_title)
            .bind(&$t.currency_html_title)
            .bind($t.currency_id)
            .bind($t.guarantee_bank)
            .bind($t.participant_cost)
            .bind($t.enquiry_period_start)
            .bind($t.enquiry_period_end)
            .bind($t.tendering_period_end)
            .bind($t.auction_start)
            .bind($t.qualification_date)
            .bind(&$t.deal_id)
            .bind($t.deal_date)
            .bind($t.deal_amount)
            .bind(&$t.deal_url)
            .bind($t.amount_by_accounts)
            .bind($t.delivery_terms_upon_request)
            .bind($t.delivery_period_to)
            .bind($t.payment_terms_day)
            .bind(&$t.delivery_address)
            .bind($t.cost)
            .bind(&$t.commentary)
            .bind($t.stage)
    };
}

/// Repository for the tender aggregate (tender + items + progress + file
/// metadata). Aggregate writes run in one transaction so a concurrent delete
/// cannot interleave mid-operation.
#[derive(Clone)]
pub struct TenderRepository {
    pool: PgPool,
}

impl TenderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "tenders", db.operation = "select"))]
    pub async fn get(&self, id: i64) -> Result<Option<Tender>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let tender = sqlx::query_as::<Postgres, Tender>("SELECT * FROM tenders WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        match tender {
            Some(mut tender) => {
                load_children(&mut *conn, &mut tender).await?;
                Ok(Some(tender))
            }
            None => Ok(None),
        }
    }

    /// Fetch a tender visible to the user through any of the three slots
    /// (owner, supplier, tenderer).
    #[tracing::instrument(skip(self), fields(db.table = "tenders", db.operation = "select"))]
    pub async fn get_for_user_any_slot(
        &self,
        id: i64,
        user_id: i64,
    ) -> Result<Option<Tender>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let tender = sqlx::query_as::<Postgres, Tender>(
            "SELECT * FROM tenders WHERE id = $1 AND (user_id = $2 OR supplier_id = $2 OR tenderer_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
        match tender {
            Some(mut tender) => {
                load_children(&mut *conn, &mut tender).await?;
                Ok(Some(tender))
            }
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM tenders WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Ownership check through the owner slot only.
    pub async fn exists_owned(&self, id: i64, user_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<Postgres, bool>(
            "SELECT EXISTS(SELECT 1 FROM tenders WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Insert a freshly ingested tender together with its items.
    #[tracing::instrument(skip(self, tender), fields(db.table = "tenders", db.operation = "insert", tender_id = tender.id))]
    pub async fn insert_aggregate(&self, tender: &Tender) -> Result<Tender, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut stored =
            bind_tender_values!(sqlx::query_as::<Postgres, Tender>(INSERT_TENDER), tender)
                .fetch_one(&mut *tx)
                .await?;

        for item in &tender.items {
            let item = sqlx::query_as::<Postgres, Item>(
                "INSERT INTO items (tender_id, title, count) VALUES ($1, $2, $3) RETURNING *",
            )
            .bind(stored.id)
            .bind(&item.title)
            .bind(&item.count)
            .fetch_one(&mut *tx)
            .await?;
            stored.items.push(item);
        }

        tx.commit().await?;
        Ok(stored)
    }

    /// Persist updated scalars and, when a replacement is supplied, swap the
    /// whole progress collection. Children stay owned by the tender row; the
    /// replacement happens in the same transaction as the scalar update.
    #[tracing::instrument(skip(self, tender, progress), fields(db.table = "tenders", db.operation = "update", tender_id = tender.id))]
    pub async fn update_aggregate(
        &self,
        tender: &Tender,
        progress: Option<Vec<ProgressEntryInput>>,
    ) -> Result<Tender, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut stored =
            bind_tender_values!(sqlx::query_as::<Postgres, Tender>(UPDATE_TENDER), tender)
                .fetch_one(&mut *tx)
                .await?;

        if let Some(entries) = progress {
            sqlx::query("DELETE FROM tender_progress WHERE tender_id = $1")
                .bind(stored.id)
                .execute(&mut *tx)
                .await?;

            for entry in entries {
                let entry = sqlx::query_as::<Postgres, ProgressEntry>(
                    "INSERT INTO tender_progress (tender_id, supplier, account_number, date, status)
                     VALUES ($1, $2, $3, $4, $5) RETURNING *",
                )
                .bind(stored.id)
                .bind(&entry.supplier)
                .bind(&entry.account_number)
                .bind(entry.date)
                .bind(entry.status)
                .fetch_one(&mut *tx)
                .await?;
                stored.progress.push(entry);
            }
            load_items_and_files(&mut *tx, &mut stored).await?;
        } else {
            load_children(&mut *tx, &mut stored).await?;
        }

        tx.commit().await?;
        Ok(stored)
    }

    /// Delete a tender and its owned children in one transaction. Returns
    /// false when the tender did not exist. Blob deletion is the caller's
    /// responsibility and happens after the commit.
    #[tracing::instrument(skip(self), fields(db.table = "tenders", db.operation = "delete"))]
    pub async fn delete_cascade(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM files WHERE tender_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tender_progress WHERE tender_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM items WHERE tender_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM tenders WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    /// Every tender, oldest first; reconciliation walks this sequentially.
    pub async fn all_ids(&self) -> Result<Vec<i64>, AppError> {
        let ids = sqlx::query_scalar::<Postgres, i64>("SELECT id FROM tenders ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }

    /// Page of tenders restricted to one relationship slot, with the dynamic
    /// filters layered on top.
    #[tracing::instrument(skip(self, filters, page), fields(db.table = "tenders", db.operation = "select"))]
    pub async fn list_for_slot(
        &self,
        slot_column: &'static str,
        user_id: i64,
        filters: &HashMap<String, String>,
        page: &ListParams,
    ) -> Result<Vec<Tender>, AppError> {
        let mut qb = QueryBuilder::new("SELECT * FROM tenders WHERE ");
        qb.push(slot_column).push(" = ").push_bind(user_id);
        apply_filters(&mut qb, TENDER_FIELDS, filters);
        push_order_and_page(&mut qb, TENDER_FIELDS, page)?;

        let tenders = qb
            .build_query_as::<Tender>()
            .fetch_all(&self.pool)
            .await?;
        Ok(tenders)
    }

    /// Unscoped page of tenders (admin listing).
    #[tracing::instrument(skip(self, filters, page), fields(db.table = "tenders", db.operation = "select"))]
    pub async fn list_all(
        &self,
        filters: &HashMap<String, String>,
        page: &ListParams,
    ) -> Result<Vec<Tender>, AppError> {
        let mut qb = QueryBuilder::new("SELECT * FROM tenders WHERE 1=1");
        apply_filters(&mut qb, TENDER_FIELDS, filters);
        push_order_and_page(&mut qb, TENDER_FIELDS, page)?;

        let tenders = qb
            .build_query_as::<Tender>()
            .fetch_all(&self.pool)
            .await?;
        Ok(tenders)
    }

    pub async fn distinct_units(&self) -> Result<Vec<String>, AppError> {
        let units = sqlx::query_scalar::<Postgres, String>(
            "SELECT DISTINCT unit FROM tenders WHERE unit IS NOT NULL ORDER BY unit",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(units)
    }
}

async fn load_children(conn: &mut PgConnection, tender: &mut Tender) -> Result<(), AppError> {
    tender.progress = sqlx::query_as::<Postgres, ProgressEntry>(
        "SELECT * FROM tender_progress WHERE tender_id = $1 ORDER BY id",
    )
    .bind(tender.id)
    .fetch_all(&mut *conn)
    .await?;
    load_items_and_files(conn, tender).await
}

async fn load_items_and_files(
    conn: &mut PgConnection,
    tender: &mut Tender,
) -> Result<(), AppError> {
    tender.items =
        sqlx::query_as::<Postgres, Item>("SELECT * FROM items WHERE tender_id = $1 ORDER BY id")
            .bind(tender.id)
            .fetch_all(&mut *conn)
            .await?;
    tender.files = sqlx::query_as::<Postgres, StoredFile>(
        "SELECT * FROM files WHERE tender_id = $1 ORDER BY id",
    )
    .bind(tender.id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(())
}
