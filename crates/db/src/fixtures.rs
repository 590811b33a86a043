use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Seed contract: each order the demo dataset must carry, with the
/// invoice state the billing scenarios depend on.
const SEED_ORDERS: &[SeedOrderContract] = &[
    SeedOrderContract {
        order_id: "ORD-123",
        status: "Delivered",
        refund_status: "None",
        description: "happy path, delivered and paid",
    },
    SeedOrderContract {
        order_id: "ORD-456",
        status: "Processing",
        refund_status: "None",
        description: "delayed order, still processing",
    },
    SeedOrderContract {
        order_id: "ORD-789",
        status: "Cancelled",
        refund_status: "Processed",
        description: "cancelled order with processed refund",
    },
];

pub const SEED_USER_ID: &str = "a7b50481-1089-49a0-97b0-5939536d53d1";
const SEED_CONVERSATION_ID: &str = "conv-seed-001";

/// Deterministic demo dataset: one user, three order/invoice pairs, and
/// one prior conversation for the history tool to recall.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed_data.sql");

    /// Load the dataset. Idempotent; re-running replaces the same rows.
    pub async fn load(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Verify the seed contract holds.
    pub async fn verify(pool: &DbPool) -> Result<SeedVerification, RepositoryError> {
        let mut checks = Vec::new();

        let user_exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)")
                .bind(SEED_USER_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("seed-user", user_exists == 1));

        for order in SEED_ORDERS {
            let order_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM orders WHERE id = ?1 AND status = ?2)",
            )
            .bind(order.order_id)
            .bind(order.status)
            .fetch_one(pool)
            .await?;
            checks.push((order.order_id, order_ok == 1));

            let invoice_ok: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM invoices WHERE order_id = ?1 AND refund_status = ?2)",
            )
            .bind(order.order_id)
            .bind(order.refund_status)
            .fetch_one(pool)
            .await?;
            checks.push((order.invoice_label(), invoice_ok == 1));
        }

        let message_count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM messages WHERE conversation_id = ?1")
                .bind(SEED_CONVERSATION_ID)
                .fetch_one(pool)
                .await?;
        checks.push(("seed-conversation-messages", message_count == 2));

        let all_present = checks.iter().all(|(_, passed)| *passed);
        Ok(SeedVerification { all_present, checks })
    }

    pub fn order_descriptions() -> Vec<(&'static str, &'static str)> {
        SEED_ORDERS.iter().map(|order| (order.order_id, order.description)).collect()
    }
}

#[derive(Debug)]
pub struct SeedVerification {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

struct SeedOrderContract {
    order_id: &'static str,
    status: &'static str,
    refund_status: &'static str,
    description: &'static str,
}

impl SeedOrderContract {
    fn invoice_label(&self) -> &'static str {
        match self.order_id {
            "ORD-123" => "ORD-123-invoice",
            "ORD-456" => "ORD-456-invoice",
            "ORD-789" => "ORD-789-invoice",
            _ => "invoice",
        }
    }
}
