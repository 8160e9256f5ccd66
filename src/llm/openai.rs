//! OpenAI-compatible chat-completions client
//!
//! Async HTTP client for `/chat/completions` style APIs (DeepSeek, OpenAI, vLLM, ...)
//! with tool calling support.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::{Config, Message, RelayError, Result, Role, ToolCall, ToolDefinition};
use crate::llm::traits::{ModelPort, ModelResponse};

/// Chat-completions API client
#[derive(Clone)]
pub struct OpenAiCompatible {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

/// Message in wire format
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Tool call in wire format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: WireFunction,
}

/// Function in a wire tool call; `arguments` is a JSON string on the wire
/// but some servers send an object
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

fn function_type() -> String {
    "function".to_string()
}

/// Chat response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

impl OpenAiCompatible {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.model.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.completions_url(),
            model: config.model.name.clone(),
            api_key: config.model.api_key.clone(),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
        })
    }

    /// Convert internal Message to wire format
    fn to_wire_message(msg: &Message) -> WireMessage {
        let tool_calls = if msg.tool_calls.is_empty() {
            None
        } else {
            Some(
                msg.tool_calls
                    .iter()
                    .map(|tc| WireToolCall {
                        id: Some(tc.id.clone()),
                        call_type: function_type(),
                        function: WireFunction {
                            name: tc.name.clone(),
                            arguments: serde_json::Value::String(tc.arguments.to_string()),
                        },
                    })
                    .collect(),
            )
        };

        let content = if msg.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(msg.content.clone())
        };

        WireMessage {
            role: msg.role.to_string(),
            content,
            tool_calls,
            tool_call_id: msg.tool_call_id.clone(),
        }
    }

    /// Decode the first choice into a [`ModelResponse`]
    fn to_model_response(response: ChatResponse) -> Result<ModelResponse> {
        let message = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| RelayError::model("Response contained no choices"))?;

        let wire_calls = message.tool_calls.unwrap_or_default();
        let ids = unique_call_ids(wire_calls.iter().map(|tc| tc.id.as_deref()));
        let calls = wire_calls
            .into_iter()
            .zip(ids)
            .map(|(tc, id)| {
                ToolCall::new(id, tc.function.name, decode_arguments(tc.function.arguments))
            })
            .collect();

        Ok(ModelResponse::tool_calls(
            message.content.unwrap_or_default(),
            calls,
        ))
    }
}

/// One id per call, unique within the reply.
///
/// Explicit ids are kept on first use; missing or repeated ones get `call_<index>`,
/// with a suffix if that name is already taken.
fn unique_call_ids<'a>(raw: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let raw: Vec<Option<&str>> = raw.map(|id| id.filter(|id| !id.is_empty())).collect();
    let explicit: HashSet<&str> = raw.iter().flatten().copied().collect();
    let mut taken: HashSet<String> = HashSet::new();

    raw.iter()
        .enumerate()
        .map(|(index, id)| {
            if let Some(id) = id {
                if taken.insert(id.to_string()) {
                    return id.to_string();
                }
            }

            let base = format!("call_{}", index);
            let mut candidate = base.clone();
            let mut suffix = 1;
            while explicit.contains(candidate.as_str()) || taken.contains(&candidate) {
                candidate = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            warn!(id = %candidate, "Assigned a tool call id");
            taken.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// Parse string-encoded arguments; anything unparseable becomes an empty object
fn decode_arguments(raw: serde_json::Value) -> serde_json::Value {
    match raw {
        serde_json::Value::String(s) if s.trim().is_empty() => serde_json::json!({}),
        serde_json::Value::String(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
            warn!(error = %e, "Tool call arguments are not valid JSON");
            serde_json::json!({})
        }),
        serde_json::Value::Null => serde_json::json!({}),
        other => other,
    }
}

#[async_trait]
impl ModelPort for OpenAiCompatible {
    async fn complete(
        &self,
        system_preamble: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse> {
        let mut wire_messages = Vec::with_capacity(messages.len() + 1);
        wire_messages.push(Self::to_wire_message(&Message::system(system_preamble)));
        wire_messages.extend(
            messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(Self::to_wire_message),
        );

        let request = ChatRequest {
            model: &self.model,
            messages: wire_messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "Sending chat completion request"
        );

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                RelayError::model(format!("Cannot connect to {}: {}", self.url, e))
            } else if e.is_timeout() {
                RelayError::model(format!("Request to {} timed out", self.url))
            } else {
                RelayError::from(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RelayError::model(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let response_text = response.text().await?;
        debug!(bytes = response_text.len(), "Received chat completion");

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| RelayError::model(format!("Failed to parse response: {}", e)))?;

        Self::to_model_response(chat_response)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assistant_tool_calls_encode_arguments_as_string() {
        let msg = Message::assistant_with_tools(
            "",
            vec![ToolCall::new("call_9", "bash", json!({"command": "ls"}))],
        );
        let wire = serde_json::to_value(OpenAiCompatible::to_wire_message(&msg)).unwrap();

        assert_eq!(wire["role"], "assistant");
        assert!(wire["content"].is_null());
        assert_eq!(wire["tool_calls"][0]["id"], "call_9");
        assert_eq!(wire["tool_calls"][0]["type"], "function");
        assert_eq!(
            wire["tool_calls"][0]["function"]["arguments"],
            json!("{\"command\":\"ls\"}")
        );
    }

    #[test]
    fn test_tool_message_carries_call_id() {
        let wire = OpenAiCompatible::to_wire_message(&Message::tool("call_2", "output"));
        assert_eq!(wire.role, "tool");
        assert_eq!(wire.tool_call_id.as_deref(), Some("call_2"));
        assert_eq!(wire.content.as_deref(), Some("output"));
    }

    #[test]
    fn test_decode_text_response() {
        let raw: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        }))
        .unwrap();

        let response = OpenAiCompatible::to_model_response(raw).unwrap();
        assert_eq!(response, ModelResponse::text("hello"));
    }

    #[test]
    fn test_decode_tool_calls_response() {
        let raw: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [
                    {"id": "a", "type": "function",
                     "function": {"name": "read", "arguments": "{\"file_path\":\"/x\"}"}},
                    {"type": "function",
                     "function": {"name": "glob", "arguments": {"pattern": "*.rs"}}},
                    {"id": "c", "type": "function",
                     "function": {"name": "bash", "arguments": "not json"}}
                ]
            }}]
        }))
        .unwrap();

        match OpenAiCompatible::to_model_response(raw).unwrap() {
            ModelResponse::ToolCalls { content, calls } => {
                assert!(content.is_empty());
                assert_eq!(calls.len(), 3);
                assert_eq!(calls[0].id, "a");
                assert_eq!(calls[0].arguments, json!({"file_path": "/x"}));
                assert_eq!(calls[1].id, "call_1");
                assert_eq!(calls[1].arguments, json!({"pattern": "*.rs"}));
                assert_eq!(calls[2].arguments, json!({}));
            }
            other => panic!("expected tool calls, got {:?}", other),
        }
    }

    #[test]
    fn test_call_ids_are_unique_within_a_reply() {
        let raw: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {
                "role": "assistant",
                "tool_calls": [
                    {"function": {"name": "read", "arguments": "{}"}},
                    {"id": "call_0", "function": {"name": "glob", "arguments": "{}"}},
                    {"id": "call_0", "function": {"name": "bash", "arguments": "{}"}}
                ]
            }}]
        }))
        .unwrap();

        let calls = match OpenAiCompatible::to_model_response(raw).unwrap() {
            ModelResponse::ToolCalls { calls, .. } => calls,
            other => panic!("expected tool calls, got {:?}", other),
        };
        let ids: Vec<&str> = calls.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["call_0_1", "call_0", "call_2"]);
    }

    #[test]
    fn test_empty_choices_is_model_error() {
        let raw: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        let err = OpenAiCompatible::to_model_response(raw).unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_fatal() {
        let mut config = Config::default();
        config.model.base_url = "http://127.0.0.1:9".to_string();
        config.model.timeout_secs = 5;
        let client = OpenAiCompatible::from_config(&config).unwrap();

        let err = client
            .complete("preamble", &[Message::user("hi")], &[])
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
