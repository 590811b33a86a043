use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};

use triage_core::agents::TOOL_GET_CONVERSATION_HISTORY;
use triage_core::domain::UserId;
use triage_db::repositories::ConversationRepository;

use super::{Tool, ToolError, parse_arguments};

const HISTORY_CONVERSATIONS: u32 = 5;
const HISTORY_MESSAGES_PER_CONVERSATION: u32 = 5;

/// Recalls what the user discussed before: the last few conversations,
/// each with its trailing messages in chronological order.
pub struct ConversationHistoryTool {
    conversations: Arc<dyn ConversationRepository>,
}

impl ConversationHistoryTool {
    pub fn new(conversations: Arc<dyn ConversationRepository>) -> Self {
        Self { conversations }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConversationHistoryArgs {
    user_id: String,
}

#[async_trait::async_trait]
impl Tool for ConversationHistoryTool {
    fn name(&self) -> &'static str {
        TOOL_GET_CONVERSATION_HISTORY
    }

    fn description(&self) -> &'static str {
        "Query the conversation history for a user to understand past context or find specific information from previous chats."
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
                    "description": "Number of recent messages to retrieve"
                }
            },
            "required": ["userId"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<Value, ToolError> {
        let args: ConversationHistoryArgs = parse_arguments(self.name(), arguments)?;
        let user_id = UserId(args.user_id);

        let conversations =
            self.conversations.recent_for_user(&user_id, HISTORY_CONVERSATIONS).await?;

        let mut history = Vec::with_capacity(conversations.len());
        for conversation in conversations {
            let mut messages = self
                .conversations
                .recent_messages(&conversation.id, HISTORY_MESSAGES_PER_CONVERSATION)
                .await?;
            // Stored newest-first; the model reads them oldest-first.
            messages.reverse();

            history.push(json!({
                "conversationId": conversation.id.0,
                "date": conversation.created_at.to_rfc3339(),
                "messages": messages
                    .iter()
                    .map(|message| json!({
                        "role": message.role.as_str(),
                        "content": message.content,
                    }))
                    .collect::<Vec<_>>(),
            }));
        }

        Ok(json!({ "history": history }))
    }
}
