//! Model-facing abstractions shared by the router and the orchestrator.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use triage_core::domain::MessageRole;

/// Callback invoked with each content fragment as the model streams it.
pub type StreamCallback = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        }
    }
}

impl From<MessageRole> for ChatRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::System => ChatRole::System,
            MessageRole::User => ChatRole::User,
            MessageRole::Assistant => ChatRole::Assistant,
        }
    }
}

/// One entry in the transcript sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into(), tool_calls: Vec::new() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into(), tool_calls: Vec::new() }
    }

    /// Assistant turn that asked for tools; the calls are echoed back so the
    /// model can line tool results up with its own requests.
    pub fn assistant_with_calls(
        content: impl Into<String>,
        tool_calls: Vec<ToolCallRequest>,
    ) -> Self {
        Self { role: ChatRole::Assistant, content: content.into(), tool_calls }
    }

    /// Serialized tool result fed back to the model.
    pub fn tool_result(payload: &Value) -> Self {
        Self { role: ChatRole::Tool, content: payload.to_string(), tool_calls: Vec::new() }
    }
}

/// A tool invocation the model asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: Value,
}

/// What one model round produced: streamed content plus any tool requests.
/// A turn with no tool requests is final.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ModelTurn {
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// Wire description of a tool the model may call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("cannot reach model endpoint at {base_url}: {source}")]
    Unreachable {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("model endpoint returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed model response: {0}")]
    Malformed(String),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Minimal surface the rest of the crate needs from a chat model: a
/// single-shot completion for classification and a tool-aware streaming
/// chat call for the orchestration loop.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;

    async fn chat_with_tools(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
        on_token: Option<&StreamCallback>,
    ) -> Result<ModelTurn, LlmError>;
}
