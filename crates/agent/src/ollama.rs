//! Ollama chat client speaking the `/api/chat` endpoint, with NDJSON
//! streaming for orchestrated turns and a plain completion for routing.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use triage_core::config::LlmConfig;

use crate::llm::{
    ChatMessage, LlmClient, LlmError, ModelTurn, StreamCallback, ToolCallRequest, ToolSpec,
};

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Clone, Serialize, Deserialize)]
struct WireToolCall {
    function: WireFunction,
}

#[derive(Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: Value,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireToolFunction,
}

#[derive(Serialize)]
struct WireToolFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: WireMessage,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    message: Option<StreamMessage>,
    #[serde(default)]
    done: bool,
}

#[derive(Deserialize)]
struct StreamMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl OllamaClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let client =
            Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.as_ref().map(|key| key.expose_secret().to_string()),
        })
    }

    fn to_wire_message(message: &ChatMessage) -> WireMessage {
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        function: WireFunction {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    })
                    .collect(),
            )
        };

        WireMessage {
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            tool_calls,
        }
    }

    fn to_wire_tools(tools: &[ToolSpec]) -> Option<Vec<WireTool>> {
        if tools.is_empty() {
            return None;
        }
        Some(
            tools
                .iter()
                .map(|spec| WireTool {
                    kind: "function",
                    function: WireToolFunction {
                        name: spec.name.clone(),
                        description: spec.description.clone(),
                        parameters: spec.parameters.clone(),
                    },
                })
                .collect(),
        )
    }

    fn transcript(system: &str, messages: &[ChatMessage]) -> Vec<WireMessage> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system".to_string(),
            content: system.to_string(),
            tool_calls: None,
        });
        wire.extend(messages.iter().map(Self::to_wire_message));
        wire
    }

    async fn post_chat(&self, request: &ChatRequest<'_>) -> Result<reqwest::Response, LlmError> {
        let mut builder = self.client.post(format!("{}/api/chat", self.base_url)).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_connect() {
                LlmError::Unreachable { base_url: self.base_url.clone(), source: error }
            } else {
                LlmError::Transport(error)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api { status: status.as_u16(), body });
        }
        Ok(response)
    }
}

#[async_trait::async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let messages = Self::transcript(system, &[ChatMessage::user(prompt)]);
        let request = ChatRequest { model: &self.model, messages, tools: None, stream: false };

        let response = self.post_chat(&request).await?;
        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|error| LlmError::Malformed(error.to_string()))?;

        Ok(parsed.message.content)
    }

    async fn chat_with_tools(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
        on_token: Option<&StreamCallback>,
    ) -> Result<ModelTurn, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: Self::transcript(system, messages),
            tools: Self::to_wire_tools(tools),
            stream: true,
        };

        let response = self.post_chat(&request).await?;

        let mut turn = ModelTurn::default();
        let mut stream = response.bytes_stream();
        let mut buffer = String::new();
        let mut done = false;

        'read: while let Some(chunk) = stream.next().await {
            let bytes = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline) = buffer.find('\n') {
                let line = buffer[..newline].trim().to_string();
                buffer.drain(..=newline);
                if line.is_empty() {
                    continue;
                }
                if apply_chunk(&line, &mut turn, on_token)? {
                    done = true;
                    break 'read;
                }
            }
        }

        let rest = buffer.trim();
        if !done && !rest.is_empty() {
            apply_chunk(rest, &mut turn, on_token)?;
        }

        Ok(turn)
    }
}

/// Fold one NDJSON line into the turn. Returns true on the final chunk.
fn apply_chunk(
    line: &str,
    turn: &mut ModelTurn,
    on_token: Option<&StreamCallback>,
) -> Result<bool, LlmError> {
    let chunk: StreamChunk =
        serde_json::from_str(line).map_err(|error| LlmError::Malformed(error.to_string()))?;

    if let Some(message) = chunk.message {
        if !message.content.is_empty() {
            turn.content.push_str(&message.content);
            if let Some(callback) = on_token {
                callback(&message.content);
            }
        }
        if let Some(calls) = message.tool_calls {
            turn.tool_calls.extend(calls.into_iter().map(|call| ToolCallRequest {
                name: call.function.name,
                arguments: call.function.arguments,
            }));
        }
    }

    Ok(chunk.done)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn_from_lines(lines: &[&str]) -> ModelTurn {
        let mut turn = ModelTurn::default();
        for line in lines {
            apply_chunk(line, &mut turn, None).expect("chunk should parse");
        }
        turn
    }

    #[test]
    fn stream_chunks_accumulate_content() {
        let turn = turn_from_lines(&[
            r#"{"message":{"content":"Hel"},"done":false}"#,
            r#"{"message":{"content":"lo"},"done":false}"#,
            r#"{"message":{"content":""},"done":true}"#,
        ]);
        assert_eq!(turn.content, "Hello");
        assert!(turn.is_final());
    }

    #[test]
    fn stream_chunks_collect_tool_calls() {
        let turn = turn_from_lines(&[
            r#"{"message":{"content":"","tool_calls":[{"function":{"name":"get_order_details","arguments":{"orderId":"ORD-123"}}}]},"done":false}"#,
            r#"{"message":{"content":""},"done":true}"#,
        ]);
        assert!(!turn.is_final());
        assert_eq!(turn.tool_calls[0].name, "get_order_details");
        assert_eq!(turn.tool_calls[0].arguments["orderId"], "ORD-123");
    }

    #[test]
    fn malformed_chunk_is_an_error() {
        let mut turn = ModelTurn::default();
        let result = apply_chunk("not json", &mut turn, None);
        assert!(matches!(result, Err(LlmError::Malformed(_))));
    }
}
