//! In-memory transport answering from a queue of canned responses

use super::client::Transport;
use super::error::ProviderError;
use crate::query::params::RequestDescriptor;
use crate::query::xml::ResponseNode;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued answers in FIFO order and records every request
#[derive(Default)]
pub struct ScriptedTransport {
    answers: Mutex<VecDeque<Result<ResponseNode, ProviderError>>>,
    received: Mutex<Vec<RequestDescriptor>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, doc: ResponseNode) -> &Self {
        self.lock_answers().push_back(Ok(doc));
        self
    }

    /// Queue a raw XML answer; panics on a malformed fixture
    pub fn push_xml(&self, xml: &str) -> &Self {
        let doc = ResponseNode::parse(xml).unwrap_or_else(|e| panic!("bad fixture: {}", e));
        self.push(doc)
    }

    pub fn push_error(&self, err: ProviderError) -> &Self {
        self.lock_answers().push_back(Err(err));
        self
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.lock_answers().len()
    }

    fn lock_answers(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<ResponseNode, ProviderError>>> {
        self.answers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn invoke(&self, request: RequestDescriptor) -> Result<ResponseNode, ProviderError> {
        let action = request.action().to_string();
        if let Ok(mut received) = self.received.lock() {
            received.push(request);
        }
        self.lock_answers()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::request_failed(format!("no scripted answer for {}", action))))
    }
}
