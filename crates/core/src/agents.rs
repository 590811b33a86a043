//! Static agent catalog: one immutable profile per intent.
//!
//! Selection is an exhaustive match over [`Intent`], so the set of
//! reachable tools per agent is fixed at compile time rather than
//! assembled dynamically per request.

use chrono::NaiveDate;

use crate::domain::UserId;
use crate::intent::Intent;

pub const TOOL_GET_ORDER_DETAILS: &str = "get_order_details";
pub const TOOL_GET_RECENT_ORDERS: &str = "get_recent_orders";
pub const TOOL_GET_INVOICE_DETAILS: &str = "get_invoice_details";
pub const TOOL_CHECK_REFUND_STATUS: &str = "check_refund_status";
pub const TOOL_GET_CONVERSATION_HISTORY: &str = "get_conversation_history";

/// Instruction for the single-shot classification call. The only valid
/// outputs are the three category names.
pub const ROUTER_PROMPT: &str = "You are a Router Agent for a customer support system.\n\
Your job is to classify the user's intent into one of three categories:\n\
1. \"ORDER\" - for questions about order status, tracking, shipping, or modifying orders.\n\
2. \"BILLING\" - for questions about invoices, payments, refunds, or subscriptions.\n\
3. \"SUPPORT\" - for general inquiries, troubleshooting, FAQs, or if the intent is unclear.\n\
\n\
Return ONLY the category name (ORDER, BILLING, or SUPPORT).";

const ORDER_PROMPT: &str = "You are an Order Support Specialist.\n\
You can help users check their order status, track shipments, and view order details.\n\
You have access to:\n\
- Product Name\n\
- Order Status (Processing, Shipped, Delivered, Cancelled)\n\
- Delivery Date\n\
- Order Amount\n\
\n\
Always be polite and helpful.\n\
If you need the user's ID to look up orders and it's not provided in the context, \
ask for it (or assume the logged-in user context if available).";

const BILLING_PROMPT: &str = "You are a Billing Support Specialist.\n\
You handle questions about invoices, payments, and refunds.\n\
You have access to:\n\
- Invoice Amount and Payment Status\n\
- Refund Status (None, Requested, Processed)\n\
- Link to Invoice PDF (Invoice URL)\n\
\n\
Verify details before confirming sensitive financial information.";

const SUPPORT_PROMPT: &str = "You are a General Customer Support Agent.\n\
You answer FAQs, help with troubleshooting, and provide general assistance.\n\
You can also query the conversation history to understand past context if needed.\n\
If you can't answer a question, advise the user to contact human support at support@example.com.";

/// System prompt plus tool subset bound to one intent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgentProfile {
    pub intent: Intent,
    pub system_prompt: String,
    pub tool_names: &'static [&'static str],
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AgentCatalog;

impl AgentCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the profile for an intent. Infallible: the intent space
    /// is closed and every variant has exactly one profile.
    ///
    /// The order and billing prompts embed `today` so the model can
    /// reason about recency; every prompt embeds the authenticated user
    /// id so tool calls scope to the right user without the caller
    /// restating it each turn.
    pub fn profile_for(&self, intent: Intent, user_id: &UserId, today: NaiveDate) -> AgentProfile {
        let (base, tool_names): (String, &'static [&'static str]) = match intent {
            Intent::Order => (
                format!("{ORDER_PROMPT}\nToday's date is {}.", today.format("%Y-%m-%d")),
                &[TOOL_GET_ORDER_DETAILS, TOOL_GET_RECENT_ORDERS],
            ),
            Intent::Billing => (
                format!("{BILLING_PROMPT}\nToday's date is {}.", today.format("%Y-%m-%d")),
                &[TOOL_GET_INVOICE_DETAILS, TOOL_CHECK_REFUND_STATUS],
            ),
            Intent::Support => (SUPPORT_PROMPT.to_string(), &[TOOL_GET_CONVERSATION_HISTORY]),
        };

        AgentProfile {
            intent,
            system_prompt: format!("{base}\nCurrent User ID: {}", user_id.0),
            tool_names,
        }
    }
}
