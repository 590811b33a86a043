use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use triage_core::domain::{Invoice, InvoiceId, OrderId, RefundStatus, UserId};

use super::order::decode_amount;
use super::{InvoiceRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInvoiceRepository {
    pool: DbPool,
}

impl SqlInvoiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const INVOICE_COLUMNS: &str =
    "id, order_id, user_id, amount, payment_status, refund_status, invoice_url";

#[async_trait::async_trait]
impl InvoiceRepository for SqlInvoiceRepository {
    async fn find_by_id(&self, id: &InvoiceId) -> Result<Option<Invoice>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_invoice(&row)).transpose()
    }

    async fn find_by_order_id(&self, id: &OrderId) -> Result<Option<Invoice>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE order_id = ?1 LIMIT 1"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| decode_invoice(&row)).transpose()
    }
}

fn decode_invoice(row: &SqliteRow) -> Result<Invoice, RepositoryError> {
    let refund_raw: Option<String> = row.get("refund_status");

    Ok(Invoice {
        id: InvoiceId(row.get("id")),
        order_id: OrderId(row.get("order_id")),
        user_id: UserId(row.get("user_id")),
        amount: decode_amount(&row.get::<String, _>("amount"))?,
        payment_status: row.get("payment_status"),
        refund_status: RefundStatus::parse_or_default(refund_raw.as_deref()),
        invoice_url: row.get("invoice_url"),
    })
}

#[cfg(test)]
mod tests {
    use triage_core::domain::{InvoiceId, OrderId, RefundStatus};

    use super::{InvoiceRepository, SqlInvoiceRepository};
    use crate::connection::{connect, memory_settings};
    use crate::{fixtures::DemoSeedDataset, migrations};

    async fn seeded_repo(name: &str) -> SqlInvoiceRepository {
        let pool = connect(&memory_settings(name)).await.expect("pool should connect");
        migrations::run_pending(&pool).await.expect("migrations");
        DemoSeedDataset::load(&pool).await.expect("seed");
        SqlInvoiceRepository::new(pool)
    }

    #[tokio::test]
    async fn finds_invoice_by_invoice_id() {
        let repo = seeded_repo("invoices_by_id").await;
        let invoice = repo
            .find_by_id(&InvoiceId("INV-123".to_string()))
            .await
            .expect("query")
            .expect("INV-123 should exist");

        assert_eq!(invoice.order_id.0, "ORD-123");
        assert_eq!(invoice.refund_status, RefundStatus::None);
    }

    #[tokio::test]
    async fn finds_invoice_by_order_id() {
        let repo = seeded_repo("invoices_by_order").await;
        let invoice = repo
            .find_by_order_id(&OrderId("ORD-789".to_string()))
            .await
            .expect("query")
            .expect("ORD-789 invoice should exist");

        assert_eq!(invoice.id.0, "INV-789");
        assert_eq!(invoice.refund_status, RefundStatus::Processed);
        assert_eq!(invoice.amount.to_string(), "200.00");
    }

    #[tokio::test]
    async fn order_id_is_not_an_invoice_id() {
        let repo = seeded_repo("invoices_miss").await;
        let by_invoice_id =
            repo.find_by_id(&InvoiceId("ORD-789".to_string())).await.expect("query");
        assert!(by_invoice_id.is_none());
    }
}
