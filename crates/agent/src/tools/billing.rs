use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use triage_core::agents::{TOOL_CHECK_REFUND_STATUS, TOOL_GET_INVOICE_DETAILS};
use triage_core::domain::{InvoiceId, OrderId};
use triage_db::repositories::InvoiceRepository;

use super::{Tool, ToolError, parse_arguments};

/// Invoice lookup that accepts either an invoice id or an order id, in
/// that precedence. Customers quote whichever id their email happens to
/// show.
pub struct InvoiceDetailsTool {
    invoices: Arc<dyn InvoiceRepository>,
}

impl InvoiceDetailsTool {
    pub fn new(invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self { invoices }
    }
}

#[derive(Deserialize)]
struct InvoiceDetailsArgs {
    id: String,
}

#[async_trait::async_trait]
impl Tool for InvoiceDetailsTool {
    fn name(&self) -> &'static str {
        TOOL_GET_INVOICE_DETAILS
    }

    fn description(&self) -> &'static str {
        "Get details of a specific invoice by Invoice ID or Order ID"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": {
                    "type": "string",
                    "description": "The unique ID of the invoice or the associated Order ID"
                }
            },
            "required": ["id"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: InvoiceDetailsArgs = parse_arguments(self.name(), arguments)?;

        let mut invoice = self.invoices.find_by_id(&InvoiceId(args.id.clone())).await?;
        if invoice.is_none() {
            invoice = self.invoices.find_by_order_id(&OrderId(args.id.clone())).await?;
        }

        match invoice {
            Some(invoice) => Ok(json!({
                "id": invoice.id.0,
                "amount": invoice.amount,
                "status": invoice.payment_status,
                "url": invoice.invoice_url,
            })),
            None => Ok(json!({ "error": format!("Invoice for ID {} not found.", args.id) })),
        }
    }
}

pub struct RefundStatusTool {
    invoices: Arc<dyn InvoiceRepository>,
}

impl RefundStatusTool {
    pub fn new(invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self { invoices }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefundStatusArgs {
    order_id: String,
}

#[async_trait::async_trait]
impl Tool for RefundStatusTool {
    fn name(&self) -> &'static str {
        TOOL_CHECK_REFUND_STATUS
    }

    fn description(&self) -> &'static str {
        "Check the status of a refund for a specific order"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "orderId": {
                    "type": "string",
                    "description": "The unique ID of the order"
                }
            },
            "required": ["orderId"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: RefundStatusArgs = parse_arguments(self.name(), arguments)?;

        match self.invoices.find_by_order_id(&OrderId(args.order_id)).await? {
            Some(invoice) => Ok(json!({
                "refundStatus": invoice.refund_status.as_str(),
                "amount": invoice.amount,
            })),
            None => Ok(json!({
                "error": "Invoice not found for this order, cannot check refund status."
            })),
        }
    }
}
