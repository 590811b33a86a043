//! Single-shot intent classification in front of the agent catalog.

use std::sync::Arc;

use tracing::warn;

use triage_core::agents::ROUTER_PROMPT;
use triage_core::intent::Intent;

use crate::llm::LlmClient;

/// Classifies an incoming message into an [`Intent`]. Never fails the
/// request: an unreachable model or an off-script answer routes to
/// [`Intent::Support`], which can field anything.
pub struct IntentRouter {
    llm: Arc<dyn LlmClient>,
}

impl IntentRouter {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, message: &str) -> Intent {
        match self.llm.complete(ROUTER_PROMPT, message).await {
            Ok(raw) => match Intent::parse(&raw) {
                Some(intent) => intent,
                None => {
                    warn!(answer = %raw.trim(), "router answer is not a known intent, falling back to SUPPORT");
                    Intent::Support
                }
            },
            Err(error) => {
                warn!(%error, "intent classification failed, falling back to SUPPORT");
                Intent::Support
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use triage_core::intent::Intent;

    use super::IntentRouter;
    use crate::llm::{ChatMessage, LlmClient, LlmError, ModelTurn, StreamCallback, ToolSpec};

    struct CannedLlm {
        answer: Result<&'static str, ()>,
    }

    #[async_trait::async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            match self.answer {
                Ok(answer) => Ok(answer.to_string()),
                Err(()) => Err(LlmError::Malformed("canned failure".to_string())),
            }
        }

        async fn chat_with_tools(
            &self,
            _system: &str,
            _messages: &[ChatMessage],
            _tools: &[ToolSpec],
            _on_token: Option<&StreamCallback>,
        ) -> Result<ModelTurn, LlmError> {
            Ok(ModelTurn::default())
        }
    }

    async fn classify(answer: Result<&'static str, ()>) -> Intent {
        let router = IntentRouter::new(Arc::new(CannedLlm { answer }));
        router.classify("where is my package?").await
    }

    #[tokio::test]
    async fn exact_labels_route_to_their_intent() {
        assert_eq!(classify(Ok("ORDER")).await, Intent::Order);
        assert_eq!(classify(Ok("BILLING")).await, Intent::Billing);
        assert_eq!(classify(Ok("SUPPORT")).await, Intent::Support);
    }

    #[tokio::test]
    async fn whitespace_and_case_are_tolerated() {
        assert_eq!(classify(Ok("  order \n")).await, Intent::Order);
        assert_eq!(classify(Ok("Billing")).await, Intent::Billing);
    }

    #[tokio::test]
    async fn off_script_answers_fall_back_to_support() {
        assert_eq!(classify(Ok("I think this is about an order")).await, Intent::Support);
        assert_eq!(classify(Ok("")).await, Intent::Support);
    }

    #[tokio::test]
    async fn classification_errors_fall_back_to_support() {
        assert_eq!(classify(Err(())).await, Intent::Support);
    }
}
