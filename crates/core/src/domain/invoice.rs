use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::UserId;
use crate::domain::order::OrderId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundStatus {
    #[default]
    None,
    Requested,
    Processed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Requested => "Requested",
            Self::Processed => "Processed",
        }
    }

    /// Unset or unrecognized storage values default to `None`.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("Requested") => Self::Requested,
            Some("Processed") => Self::Processed,
            _ => Self::None,
        }
    }
}

/// External billing record, read-only here like `Order`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub payment_status: String,
    pub refund_status: RefundStatus,
    pub invoice_url: Option<String>,
}
