use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use triage_core::domain::{Order, OrderId, OrderStatus, UserId};

use super::{OrderRepository, RepositoryError};
use crate::DbPool;

pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, product_name, status, amount, delivery_date, created_at";

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| decode_order(&row)).transpose()
    }

    async fn recent_for_user(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(&user_id.0)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_order).collect()
    }
}

fn decode_order(row: &SqliteRow) -> Result<Order, RepositoryError> {
    let status_raw: String = row.get("status");
    let status = OrderStatus::parse(&status_raw)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown order status `{status_raw}`")))?;

    let delivery_date: Option<String> = row.get("delivery_date");

    Ok(Order {
        id: OrderId(row.get("id")),
        user_id: UserId(row.get("user_id")),
        product_name: row.get("product_name"),
        status,
        amount: decode_amount(&row.get::<String, _>("amount"))?,
        delivery_date: delivery_date.as_deref().map(decode_timestamp).transpose()?,
        created_at: decode_timestamp(&row.get::<String, _>("created_at"))?,
    })
}

pub(crate) fn decode_amount(raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("invalid amount `{raw}`: {error}")))
}

pub(crate) fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{raw}`: {error}")))
}
