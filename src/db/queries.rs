use super::store::InvoiceStore;
use crate::error::StoreError;
use crate::models::Invoice;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

/// Postgres-backed `invoices_supplier` collection: one JSONB document per row.
pub struct PgInvoiceStore {
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Create the collection table and its unique key index if missing
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS invoices_supplier (
            id BIGSERIAL PRIMARY KEY,
            doc JSONB NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_invoices_supplier_key
        ON invoices_supplier ((doc->>'supplier_id'), (doc->>'number'))
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Schema for invoices_supplier ready");
    Ok(())
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn count_matching(&self, supplier_id: &str, number: &str) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT count(*)
            FROM invoices_supplier
            WHERE doc->>'supplier_id' = $1
              AND doc->>'number' = $2
            "#,
        )
        .bind(supplier_id)
        .bind(number)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert_one(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let doc = serde_json::to_value(invoice)?;
        sqlx::query("INSERT INTO invoices_supplier (doc) VALUES ($1)")
            .bind(Json(doc))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_status(&self, supplier_id: &str, number: &str, status: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE invoices_supplier
            SET doc = jsonb_set(doc, '{status}', to_jsonb($3::text))
            WHERE doc->>'supplier_id' = $1
              AND doc->>'number' = $2
            "#,
        )
        .bind(supplier_id)
        .bind(number)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
