//! Scripted model backend
//!
//! Replays a fixed sequence of replies and records every request. Deterministic, so a
//! conversation driven by it can be replayed and compared.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::{Message, RelayError, Result, ToolDefinition};
use crate::llm::traits::{ModelPort, ModelResponse};

/// A request as seen by the scripted backend
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system_preamble: String,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

enum Script {
    Queue(VecDeque<std::result::Result<ModelResponse, String>>),
    Repeat(ModelResponse),
}

/// Model port that answers from a script
pub struct ScriptedModel {
    script: Mutex<Script>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedModel {
    /// Reply with `responses` in order, failing once they run out
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self::from_replies(responses.into_iter().map(Ok).collect())
    }

    /// Reply with a mix of responses and backend failures
    pub fn from_replies(replies: Vec<std::result::Result<ModelResponse, String>>) -> Self {
        Self {
            script: Mutex::new(Script::Queue(replies.into())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply with the same response forever
    pub fn repeating(response: ModelResponse) -> Self {
        Self {
            script: Mutex::new(Script::Repeat(response)),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, oldest first
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of `complete` calls received so far
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl ModelPort for ScriptedModel {
    async fn complete(
        &self,
        system_preamble: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse> {
        self.requests.lock().await.push(RecordedRequest {
            system_preamble: system_preamble.to_string(),
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name().to_string()).collect(),
        });

        match &mut *self.script.lock().await {
            Script::Repeat(response) => Ok(response.clone()),
            Script::Queue(queue) => match queue.pop_front() {
                Some(Ok(response)) => Ok(response),
                Some(Err(message)) => Err(RelayError::model(message)),
                None => Err(RelayError::model("Scripted model has no replies left")),
            },
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
