use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::UserId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Processing" => Some(Self::Processing),
            "Shipped" => Some(Self::Shipped),
            "Delivered" => Some(Self::Delivered),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// External commerce record. This system only ever reads orders; the
/// commerce side owns their lifecycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub product_name: String,
    pub status: OrderStatus,
    pub amount: Decimal,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
