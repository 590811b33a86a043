use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use triage_core::agents::{TOOL_GET_ORDER_DETAILS, TOOL_GET_RECENT_ORDERS};
use triage_core::domain::{Order, OrderId, UserId};
use triage_db::repositories::OrderRepository;

use super::{Tool, ToolError, parse_arguments};

pub struct OrderDetailsTool {
    orders: Arc<dyn OrderRepository>,
}

impl OrderDetailsTool {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderDetailsArgs {
    order_id: String,
}

#[async_trait::async_trait]
impl Tool for OrderDetailsTool {
    fn name(&self) -> &'static str {
        TOOL_GET_ORDER_DETAILS
    }

    fn description(&self) -> &'static str {
        "Get details of a specific order by Order ID"
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
        let args: OrderDetailsArgs = parse_arguments(self.name(), arguments)?;

        match self.orders.find_by_id(&OrderId(args.order_id.clone())).await? {
            Some(order) => Ok(json!({
                "id": order.id.0,
                "status": order.status.as_str(),
                "amount": order.amount,
                "date": order.created_at.format("%Y-%m-%d").to_string(),
                "items": order.product_name,
            })),
            None => Ok(json!({ "error": format!("Order {} not found.", args.order_id) })),
        }
    }
}

pub struct RecentOrdersTool {
    orders: Arc<dyn OrderRepository>,
}

impl RecentOrdersTool {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }
}

fn default_order_limit() -> u32 {
    5
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentOrdersArgs {
    user_id: String,
    #[serde(default = "default_order_limit")]
    limit: u32,
}

fn order_summary(order: &Order) -> Value {
    json!({
        "id": order.id.0,
        "status": order.status.as_str(),
        "amount": order.amount,
        "date": order.created_at.format("%Y-%m-%d").to_string(),
    })
}

#[async_trait::async_trait]
impl Tool for RecentOrdersTool {
    fn name(&self) -> &'static str {
        TOOL_GET_RECENT_ORDERS
    }

    fn description(&self) -> &'static str {
        "Get the most recent orders for a user"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "userId": {
                    "type": "string",
                    "description": "The unique ID of the user"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of orders to return"
                }
            },
            "required": ["userId"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: RecentOrdersArgs = parse_arguments(self.name(), arguments)?;

        let orders =
            self.orders.recent_for_user(&UserId(args.user_id), args.limit).await?;
        if orders.is_empty() {
            return Ok(json!({ "message": "No recent orders found." }));
        }

        Ok(json!({ "orders": orders.iter().map(order_summary).collect::<Vec<_>>() }))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;
    use triage_core::domain::{Order, OrderId, OrderStatus, UserId};
    use triage_db::repositories::InMemoryOrderRepository;

    use super::{OrderDetailsTool, RecentOrdersTool, Tool};

    fn order(id: &str, user: &str, days_ago: i64) -> Order {
        Order {
            id: OrderId(id.to_string()),
            user_id: UserId(user.to_string()),
            product_name: "Wireless Headphones".to_string(),
            status: OrderStatus::Delivered,
            amount: Decimal::from_str("120.50").expect("valid amount"),
            delivery_date: None,
            created_at: Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).single().expect("valid time")
                - Duration::days(days_ago),
        }
    }

    #[tokio::test]
    async fn order_details_returns_the_order_payload() {
        let repo = Arc::new(InMemoryOrderRepository::new(vec![order("ORD-123", "u-1", 0)]));
        let tool = OrderDetailsTool::new(repo);

        let payload =
            tool.execute(json!({"orderId": "ORD-123"})).await.expect("lookup succeeds");
        assert_eq!(payload["id"], "ORD-123");
        assert_eq!(payload["status"], "Delivered");
        assert_eq!(payload["items"], "Wireless Headphones");
        assert_eq!(payload["date"], "2025-03-14");
    }

    #[tokio::test]
    async fn missing_order_is_an_error_payload_not_a_failure() {
        let repo = Arc::new(InMemoryOrderRepository::default());
        let tool = OrderDetailsTool::new(repo);

        let payload =
            tool.execute(json!({"orderId": "ORD-000"})).await.expect("lookup succeeds");
        assert_eq!(payload["error"], "Order ORD-000 not found.");
    }

    #[tokio::test]
    async fn recent_orders_defaults_to_five_and_reports_empty() {
        let orders: Vec<_> = (0..7).map(|day| order(&format!("ORD-{day}"), "u-1", day)).collect();
        let tool = RecentOrdersTool::new(Arc::new(InMemoryOrderRepository::new(orders)));

        let payload = tool.execute(json!({"userId": "u-1"})).await.expect("lookup succeeds");
        let listed = payload["orders"].as_array().expect("orders array");
        assert_eq!(listed.len(), 5);
        assert_eq!(listed[0]["id"], "ORD-0");

        let empty =
            tool.execute(json!({"userId": "nobody"})).await.expect("lookup succeeds");
        assert_eq!(empty["message"], "No recent orders found.");
    }

    #[tokio::test]
    async fn arguments_missing_required_fields_are_rejected() {
        let tool = OrderDetailsTool::new(Arc::new(InMemoryOrderRepository::default()));
        let result = tool.execute(json!({})).await;
        assert!(result.is_err());
    }
}
