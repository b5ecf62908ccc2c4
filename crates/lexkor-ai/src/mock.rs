//! Scripted chat model for tests and offline runs.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::llm::{ChatModel, ChatRequest, ChatResponse, Delta, DeltaStream, LlmReply};

/// Characters per streamed delta.
const STREAM_CHUNK_CHARS: usize = 16;

/// Replays a fixed queue of replies and records every request it receives.
///
/// Streaming requests get the scripted text split into several deltas. Once
/// the queue is empty every call fails with [`LlmError::Decode`].
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model that answers once with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new([Ok(text.into())])
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn create(&self, request: ChatRequest) -> Result<LlmReply, LlmError> {
        let stream = request.stream;
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Decode("scripted replies exhausted".to_string())));
        let text = next?;

        if !stream {
            return Ok(LlmReply::Message(ChatResponse::text(text)));
        }

        let chars: Vec<char> = text.chars().collect();
        let mut deltas: Vec<Result<Delta, LlmError>> = chars
            .chunks(STREAM_CHUNK_CHARS)
            .map(|chunk| {
                Ok(Delta {
                    content: Some(chunk.iter().collect()),
                    ..Delta::default()
                })
            })
            .collect();
        deltas.push(Ok(Delta {
            finish_reason: Some("stop".to_string()),
            ..Delta::default()
        }));
        let stream: DeltaStream = Box::pin(futures::stream::iter(deltas));
        Ok(LlmReply::Stream(stream))
    }
}
