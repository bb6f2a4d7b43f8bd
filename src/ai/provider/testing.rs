//! Scripted provider for tests
//!
//! Answers by `CallKind` and records every request so tests can assert which
//! pipeline stages ran. Each kind holds a queue of replies; the last reply
//! repeats once the queue is down to one entry.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::{CallKind, CompletionRequest, LlmProvider, LlmResponse};
use crate::types::{ErrorCategory, LlmError, Result};

#[derive(Clone)]
enum Reply {
    Text(LlmResponse),
    Fail(ErrorCategory),
}

#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<HashMap<CallKind, VecDeque<Reply>>>,
    log: Mutex<Vec<CompletionRequest>>,
    unhealthy: bool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, kind: CallKind, reply: Reply) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.entry(kind).or_default().push_back(reply);
        }
        self
    }

    pub fn respond(self, kind: CallKind, text: impl Into<String>) -> Self {
        self.push(kind, Reply::Text(LlmResponse::text_only(text)))
    }

    pub fn respond_with_citations(
        self,
        kind: CallKind,
        text: impl Into<String>,
        citations: &[&str],
    ) -> Self {
        let response = LlmResponse::text_only(text)
            .with_citations(citations.iter().map(|c| c.to_string()).collect());
        self.push(kind, Reply::Text(response))
    }

    pub fn fail(self, kind: CallKind, category: ErrorCategory) -> Self {
        self.push(kind, Reply::Fail(category))
    }

    /// Report `false` from `health_check`
    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.log.lock().map(|log| log.clone()).unwrap_or_default()
    }

    pub fn calls(&self, kind: CallKind) -> usize {
        self.requests().iter().filter(|r| r.kind == kind).count()
    }

    pub fn called(&self, kind: CallKind) -> bool {
        self.calls(kind) > 0
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, request: &CompletionRequest) -> Result<LlmResponse> {
        if let Ok(mut log) = self.log.lock() {
            log.push(request.clone());
        }

        let reply = self.replies.lock().ok().and_then(|mut replies| {
            let queue = replies.get_mut(&request.kind)?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });

        match reply {
            Some(Reply::Text(response)) => Ok(response),
            Some(Reply::Fail(category)) => {
                Err(LlmError::with_provider(category, "scripted failure", "scripted").into())
            }
            None => Err(LlmError::with_provider(
                ErrorCategory::BadRequest,
                format!("no scripted reply for {}", request.kind),
                "scripted",
            )
            .into()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.unhealthy)
    }
}
