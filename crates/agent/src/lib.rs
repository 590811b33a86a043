//! Agent runtime: intent routing, tool execution, and the orchestration
//! loop that drives a model turn-by-turn until it produces a final reply.

pub mod context;
pub mod llm;
pub mod ollama;
pub mod orchestrator;
pub mod router;
pub mod tools;

pub use context::ContextManager;
pub use llm::{ChatMessage, ChatRole, LlmClient, LlmError, ModelTurn, ToolCallRequest};
pub use ollama::OllamaClient;
pub use orchestrator::{OrchestrationOutcome, Orchestrator};
pub use router::IntentRouter;
pub use tools::{Tool, ToolError, ToolRegistry, ToolSet};
