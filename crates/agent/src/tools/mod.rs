//! Data-lookup tools the model can call, plus the registry that hands
//! each agent its fixed subset.
//!
//! Domain misses (unknown order, no invoice) are not errors: they come
//! back as `{"error": ...}` payloads the model can read and explain.
//! [`ToolError`] is reserved for infrastructure problems.

mod billing;
mod order;
mod support;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use triage_db::repositories::{
    ConversationRepository, InvoiceRepository, OrderRepository, RepositoryError,
};

use crate::llm::ToolSpec;

pub use billing::{InvoiceDetailsTool, RefundStatusTool};
pub use order::{OrderDetailsTool, RecentOrdersTool};
pub use support::ConversationHistoryTool;

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema for the arguments, advertised to the model.
    fn parameters(&self) -> Value;
    async fn execute(&self, arguments: Value) -> Result<Value, ToolError>;
}

/// All registered tools. Agents never see the registry directly; they
/// get a [`ToolSet`] carved out by name.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry wired with the full support tool catalog.
    pub fn standard(
        orders: Arc<dyn OrderRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        conversations: Arc<dyn ConversationRepository>,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(OrderDetailsTool::new(orders.clone())));
        registry.register(Arc::new(RecentOrdersTool::new(orders)));
        registry.register(Arc::new(InvoiceDetailsTool::new(invoices.clone())));
        registry.register(Arc::new(RefundStatusTool::new(invoices)));
        registry.register(Arc::new(ConversationHistoryTool::new(conversations)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name).cloned()
    }

    /// Carve out the named subset, preserving the order of `names`.
    /// Names with no registered tool are skipped.
    pub fn subset(&self, names: &[&str]) -> ToolSet {
        let tools = names.iter().filter_map(|name| self.get(name)).collect();
        ToolSet { tools }
    }
}

/// The tools one agent may call.
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn execute(&self, name: &str, arguments: Value) -> Result<Value, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(arguments).await
    }
}

pub(crate) fn parse_arguments<T: DeserializeOwned>(
    tool: &'static str,
    arguments: Value,
) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|error| ToolError::InvalidArguments { tool, reason: error.to_string() })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use triage_core::agents;
    use triage_db::repositories::{
        InMemoryConversationRepository, InMemoryInvoiceRepository, InMemoryOrderRepository,
    };

    use super::{ToolError, ToolRegistry};

    fn registry() -> ToolRegistry {
        ToolRegistry::standard(
            Arc::new(InMemoryOrderRepository::default()),
            Arc::new(InMemoryInvoiceRepository::default()),
            Arc::new(InMemoryConversationRepository::new()),
        )
    }

    #[test]
    fn standard_registry_carries_the_full_catalog() {
        let registry = registry();
        for name in [
            agents::TOOL_GET_ORDER_DETAILS,
            agents::TOOL_GET_RECENT_ORDERS,
            agents::TOOL_GET_INVOICE_DETAILS,
            agents::TOOL_CHECK_REFUND_STATUS,
            agents::TOOL_GET_CONVERSATION_HISTORY,
        ] {
            assert!(registry.get(name).is_some(), "missing tool {name}");
        }
    }

    #[test]
    fn subset_preserves_requested_order_and_skips_unknown_names() {
        let registry = registry();
        let set = registry.subset(&[
            agents::TOOL_CHECK_REFUND_STATUS,
            "not_a_tool",
            agents::TOOL_GET_INVOICE_DETAILS,
        ]);

        let specs = set.specs();
        assert_eq!(set.len(), 2);
        assert_eq!(specs[0].name, agents::TOOL_CHECK_REFUND_STATUS);
        assert_eq!(specs[1].name, agents::TOOL_GET_INVOICE_DETAILS);

        assert!(registry.subset(&["not_a_tool"]).is_empty());
    }

    #[tokio::test]
    async fn executing_an_unlisted_tool_is_an_error() {
        let registry = registry();
        let set = registry.subset(&[agents::TOOL_GET_ORDER_DETAILS]);

        let result = set.execute("get_conversation_history", json!({})).await;
        assert!(matches!(result, Err(ToolError::UnknownTool(_))));
    }
}
