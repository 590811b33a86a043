//! The chat endpoint.
//!
//! `POST /api/chat` classifies the message, resolves the conversation,
//! and streams the agent's reply as plain-text chunks. The assistant
//! message is persisted once the loop finishes, so what the client saw
//! and what the history stores are the same text.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info, warn};

use triage_agent::{
    ChatMessage, ContextManager, IntentRouter, LlmClient, Orchestrator, ToolRegistry,
};
use triage_core::AgentCatalog;
use triage_core::config::ChatConfig;
use triage_core::domain::{ConversationId, MessageRole, UserId};
use triage_core::errors::InterfaceError;
use triage_db::repositories::{ConversationRepository, InvoiceRepository, OrderRepository};

pub const CONVERSATION_HEADER: &str = "x-conversation-id";
pub const INTENT_HEADER: &str = "x-intent";

pub struct ChatState {
    catalog: AgentCatalog,
    router: IntentRouter,
    context: ContextManager,
    orchestrator: Orchestrator,
    registry: ToolRegistry,
    default_user_id: String,
}

impl ChatState {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        orders: Arc<dyn OrderRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        conversations: Arc<dyn ConversationRepository>,
        chat: &ChatConfig,
    ) -> Self {
        Self {
            catalog: AgentCatalog::new(),
            router: IntentRouter::new(llm.clone()),
            context: ContextManager::new(conversations.clone(), chat.context_window),
            orchestrator: Orchestrator::new(llm, chat.max_rounds),
            registry: ToolRegistry::standard(orders, invoices, conversations),
            default_user_id: chat.default_user_id.clone(),
        }
    }
}

/// One transcript entry as the client sends it.
#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn router(state: Arc<ChatState>) -> Router {
    Router::new().route("/api/chat", post(chat)).with_state(state)
}

fn error_response(error: &InterfaceError) -> (StatusCode, Json<ErrorBody>) {
    let status = match error {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(ErrorBody { error: error.user_message().to_string() }))
}

pub async fn chat(
    State(state): State<Arc<ChatState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, (StatusCode, Json<ErrorBody>)> {
    let last = request.messages.last().ok_or_else(|| {
        error_response(&InterfaceError::bad_request("messages must not be empty"))
    })?;
    if last.role != MessageRole::User {
        return Err(error_response(&InterfaceError::bad_request(
            "last message must be from the user",
        )));
    }
    let message = last.content.trim().to_string();
    if message.is_empty() {
        return Err(error_response(&InterfaceError::bad_request("message must not be empty")));
    }

    let transcript: Vec<ChatMessage> = request
        .messages
        .iter()
        .map(|entry| ChatMessage {
            role: entry.role.into(),
            content: entry.content.clone(),
            tool_calls: Vec::new(),
        })
        .collect();

    let user_id = UserId(request.user_id.unwrap_or_else(|| state.default_user_id.clone()));
    let requested = request.conversation_id.map(ConversationId);

    let intent = state.router.classify(&message).await;

    let conversation =
        state.context.resolve(&user_id, requested.as_ref()).await.map_err(|db_error| {
            error!(%db_error, "conversation resolution failed");
            error_response(&InterfaceError::internal("conversation resolution failed"))
        })?;

    state
        .context
        .record(&conversation.id, MessageRole::User, message.clone())
        .await
        .map_err(|db_error| {
            error!(%db_error, "failed to persist user message");
            error_response(&InterfaceError::internal("failed to persist message"))
        })?;

    let window = state.context.window_for(&transcript).to_vec();

    let profile = state.catalog.profile_for(intent, &user_id, Utc::now().date_naive());
    let tools = state.registry.subset(profile.tool_names);

    info!(
        event_name = "chat.request.accepted",
        conversation_id = %conversation.id.0,
        intent = intent.as_str(),
        tools = tools.len(),
        "dispatching to agent"
    );

    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel::<String>();
    let task_state = state.clone();
    let conversation_id = conversation.id.clone();
    tokio::spawn(async move {
        // Keeps the response stream open until the reply is persisted.
        let stream_guard = chunk_tx.clone();

        match task_state
            .orchestrator
            .run(&profile.system_prompt, window, &tools, chunk_tx)
            .await
        {
            Ok(outcome) => {
                if outcome.cap_exceeded {
                    warn!(
                        event_name = "chat.loop.cap_exceeded",
                        conversation_id = %conversation_id.0,
                        rounds = outcome.rounds_used,
                        "reply may be incomplete"
                    );
                }
                if let Err(db_error) = task_state
                    .context
                    .record(&conversation_id, MessageRole::Assistant, outcome.reply)
                    .await
                {
                    error!(
                        %db_error,
                        conversation_id = %conversation_id.0,
                        "failed to persist assistant reply"
                    );
                }
                info!(
                    event_name = "chat.request.completed",
                    conversation_id = %conversation_id.0,
                    rounds = outcome.rounds_used,
                    "agent loop finished"
                );
            }
            Err(llm_error) => {
                error!(
                    event_name = "chat.loop.failed",
                    conversation_id = %conversation_id.0,
                    %llm_error,
                    "agent loop aborted; stream closed early"
                );
            }
        }

        drop(stream_guard);
    });

    let body = Body::from_stream(
        UnboundedReceiverStream::new(chunk_rx)
            .map(|chunk| Ok::<_, Infallible>(Bytes::from(chunk))),
    );

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONVERSATION_HEADER, conversation.id.0.clone())
        .header(INTENT_HEADER, intent.as_str())
        .body(body)
        .map_err(|build_error| {
            error!(%build_error, "failed to build streaming response");
            error_response(&InterfaceError::internal("failed to build response"))
        })?;

    Ok(response.into_response())
}
