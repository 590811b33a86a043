//! The turn-by-turn loop between the model and its tools.
//!
//! Each round sends the transcript to the model. A turn without tool
//! requests ends the loop; a turn with requests executes every one,
//! feeds the results back, and goes around again, up to a fixed cap.

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::llm::{ChatMessage, LlmClient, LlmError, StreamCallback, ToolCallRequest};
use crate::tools::ToolSet;

/// Where the loop currently stands.
enum LoopState {
    /// About to ask the model for round `round`.
    AwaitingModel { round: u32 },
    /// The model asked for tools in round `round`; execute them.
    ExecutingTools { round: u32, calls: Vec<ToolCallRequest> },
    Done { cap_exceeded: bool },
}

#[derive(Debug)]
pub struct OrchestrationOutcome {
    /// Everything the model said, identical to the concatenation of the
    /// streamed fragments.
    pub reply: String,
    pub rounds_used: u32,
    /// The loop stopped at the round cap with tool requests still
    /// pending, so the reply may be incomplete.
    pub cap_exceeded: bool,
}

pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    max_rounds: u32,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, max_rounds: u32) -> Self {
        Self { llm, max_rounds }
    }

    /// Drive the loop to completion. `history` is the replayed window
    /// including the new user message; streamed fragments go to `chunks`
    /// as they arrive. A closed receiver stops nothing; the fragments
    /// are simply dropped and the outcome still carries the full reply.
    pub async fn run(
        &self,
        system_prompt: &str,
        history: Vec<ChatMessage>,
        tools: &ToolSet,
        chunks: UnboundedSender<String>,
    ) -> Result<OrchestrationOutcome, LlmError> {
        let specs = tools.specs();
        let mut transcript = history;
        let mut reply = String::new();
        let mut rounds_used = 0;

        let on_token: StreamCallback = Box::new(move |token: &str| {
            let _ = chunks.send(token.to_string());
        });

        let mut state = LoopState::AwaitingModel { round: 1 };
        let cap_exceeded = loop {
            state = match state {
                LoopState::AwaitingModel { round } if round > self.max_rounds => {
                    warn!(max_rounds = self.max_rounds, "round cap reached with tools still pending");
                    LoopState::Done { cap_exceeded: true }
                }
                LoopState::AwaitingModel { round } => {
                    let turn = self
                        .llm
                        .chat_with_tools(system_prompt, &transcript, &specs, Some(&on_token))
                        .await?;
                    rounds_used = round;
                    reply.push_str(&turn.content);

                    if turn.is_final() {
                        LoopState::Done { cap_exceeded: false }
                    } else {
                        debug!(round, requested = turn.tool_calls.len(), "model requested tools");
                        transcript.push(ChatMessage::assistant_with_calls(
                            turn.content,
                            turn.tool_calls.clone(),
                        ));
                        LoopState::ExecutingTools { round, calls: turn.tool_calls }
                    }
                }
                LoopState::ExecutingTools { round, calls } => {
                    for call in calls {
                        let payload = match tools.execute(&call.name, call.arguments).await {
                            Ok(payload) => payload,
                            Err(error) => {
                                warn!(tool = %call.name, %error, "tool execution failed");
                                json!({ "error": error.to_string() })
                            }
                        };
                        transcript.push(ChatMessage::tool_result(&payload));
                    }
                    LoopState::AwaitingModel { round: round + 1 }
                }
                LoopState::Done { cap_exceeded } => break cap_exceeded,
            };
        };

        Ok(OrchestrationOutcome { reply, rounds_used, cap_exceeded })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tokio::sync::mpsc;
    use triage_db::repositories::{
        InMemoryConversationRepository, InMemoryInvoiceRepository, InMemoryOrderRepository,
    };

    use super::Orchestrator;
    use crate::llm::{
        ChatMessage, ChatRole, LlmClient, LlmError, ModelTurn, StreamCallback, ToolCallRequest,
        ToolSpec,
    };
    use crate::tools::{ToolRegistry, ToolSet};

    /// Plays back a fixed sequence of turns, streaming each turn's
    /// content in two fragments. Repeats the last turn once exhausted.
    struct ScriptedLlm {
        turns: Mutex<Vec<ModelTurn>>,
        transcripts_seen: Mutex<Vec<usize>>,
    }

    impl ScriptedLlm {
        fn new(turns: Vec<ModelTurn>) -> Self {
            let mut turns = turns;
            turns.reverse();
            Self { turns: Mutex::new(turns), transcripts_seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedLlm {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
            Ok("SUPPORT".to_string())
        }

        async fn chat_with_tools(
            &self,
            _system: &str,
            messages: &[ChatMessage],
            _tools: &[ToolSpec],
            on_token: Option<&StreamCallback>,
        ) -> Result<ModelTurn, LlmError> {
            self.transcripts_seen.lock().expect("lock").push(messages.len());

            let turn = {
                let mut turns = self.turns.lock().expect("lock");
                if turns.len() > 1 { turns.pop().expect("non-empty") } else { turns[0].clone() }
            };

            if let Some(callback) = on_token {
                let half = turn.content.len() / 2;
                let (left, right) = turn.content.split_at(half);
                if !left.is_empty() {
                    callback(left);
                }
                if !right.is_empty() {
                    callback(right);
                }
            }
            Ok(turn)
        }
    }

    fn tool_set() -> ToolSet {
        let registry = ToolRegistry::standard(
            Arc::new(InMemoryOrderRepository::default()),
            Arc::new(InMemoryInvoiceRepository::default()),
            Arc::new(InMemoryConversationRepository::new()),
        );
        registry.subset(&["get_order_details", "get_recent_orders"])
    }

    fn tool_turn(name: &str, arguments: serde_json::Value) -> ModelTurn {
        ModelTurn {
            content: String::new(),
            tool_calls: vec![ToolCallRequest { name: name.to_string(), arguments }],
        }
    }

    fn final_turn(content: &str) -> ModelTurn {
        ModelTurn { content: content.to_string(), tool_calls: Vec::new() }
    }

    async fn drain(receiver: &mut mpsc::UnboundedReceiver<String>) -> String {
        let mut streamed = String::new();
        while let Ok(chunk) = receiver.try_recv() {
            streamed.push_str(&chunk);
        }
        streamed
    }

    #[tokio::test]
    async fn a_final_turn_ends_the_loop_in_one_round() {
        let llm = Arc::new(ScriptedLlm::new(vec![final_turn("All sorted!")]));
        let orchestrator = Orchestrator::new(llm, 5);
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let outcome = orchestrator
            .run("prompt", vec![ChatMessage::user("hi")], &tool_set(), sender)
            .await
            .expect("loop completes");

        assert_eq!(outcome.reply, "All sorted!");
        assert_eq!(outcome.rounds_used, 1);
        assert!(!outcome.cap_exceeded);
        assert_eq!(drain(&mut receiver).await, "All sorted!");
    }

    #[tokio::test]
    async fn tool_rounds_feed_results_back_into_the_transcript() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            tool_turn("get_order_details", json!({"orderId": "ORD-1"})),
            final_turn("That order does not exist."),
        ]));
        let orchestrator = Orchestrator::new(llm.clone(), 5);
        let (sender, _receiver) = mpsc::unbounded_channel();

        let outcome = orchestrator
            .run("prompt", vec![ChatMessage::user("where is ORD-1?")], &tool_set(), sender)
            .await
            .expect("loop completes");

        assert_eq!(outcome.rounds_used, 2);
        assert!(!outcome.cap_exceeded);

        // Round one saw the user message; round two additionally saw the
        // assistant's tool request and the tool result.
        let seen = llm.transcripts_seen.lock().expect("lock").clone();
        assert_eq!(seen, vec![1, 3]);
    }

    #[tokio::test]
    async fn a_greedy_model_is_stopped_at_the_round_cap() {
        let llm = Arc::new(ScriptedLlm::new(vec![tool_turn(
            "get_recent_orders",
            json!({"userId": "u-1"}),
        )]));
        let orchestrator = Orchestrator::new(llm.clone(), 5);
        let (sender, _receiver) = mpsc::unbounded_channel();

        let outcome = orchestrator
            .run("prompt", vec![ChatMessage::user("orders?")], &tool_set(), sender)
            .await
            .expect("loop completes");

        assert_eq!(outcome.rounds_used, 5);
        assert!(outcome.cap_exceeded);
        assert_eq!(llm.transcripts_seen.lock().expect("lock").len(), 5);
    }

    #[tokio::test]
    async fn unknown_tool_requests_become_error_results_not_failures() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            tool_turn("no_such_tool", json!({})),
            final_turn("Sorry, I could not look that up."),
        ]));
        let orchestrator = Orchestrator::new(llm, 5);
        let (sender, _receiver) = mpsc::unbounded_channel();

        let outcome = orchestrator
            .run("prompt", vec![ChatMessage::user("hm")], &tool_set(), sender)
            .await
            .expect("loop completes");

        assert_eq!(outcome.reply, "Sorry, I could not look that up.");
        assert!(!outcome.cap_exceeded);
    }

    #[tokio::test]
    async fn streamed_fragments_concatenate_to_the_reply() {
        let llm = Arc::new(ScriptedLlm::new(vec![
            tool_turn("get_order_details", json!({"orderId": "ORD-1"})),
            final_turn("Your order ORD-1 is on its way."),
        ]));
        let orchestrator = Orchestrator::new(llm, 5);
        let (sender, mut receiver) = mpsc::unbounded_channel();

        let outcome = orchestrator
            .run("prompt", vec![ChatMessage::user("hi")], &tool_set(), sender)
            .await
            .expect("loop completes");

        assert_eq!(drain(&mut receiver).await, outcome.reply);
    }

    #[tokio::test]
    async fn a_dropped_receiver_does_not_abort_the_loop() {
        let llm = Arc::new(ScriptedLlm::new(vec![final_turn("Still here.")]));
        let orchestrator = Orchestrator::new(llm, 5);
        let (sender, receiver) = mpsc::unbounded_channel();
        drop(receiver);

        let outcome = orchestrator
            .run("prompt", vec![ChatMessage::user("hi")], &tool_set(), sender)
            .await
            .expect("loop completes");
        assert_eq!(outcome.reply, "Still here.");
    }

    #[tokio::test]
    async fn history_roles_reach_the_model_unchanged() {
        let llm = Arc::new(ScriptedLlm::new(vec![final_turn("ok")]));
        let orchestrator = Orchestrator::new(llm, 5);
        let (sender, _receiver) = mpsc::unbounded_channel();

        let history = vec![
            ChatMessage::user("earlier question"),
            ChatMessage::assistant("earlier answer"),
            ChatMessage::user("new question"),
        ];
        assert_eq!(history[1].role, ChatRole::Assistant);

        let outcome =
            orchestrator.run("prompt", history, &tool_set(), sender).await.expect("completes");
        assert_eq!(outcome.rounds_used, 1);
    }
}
