use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use goldfish_core::SourceAdapter;
use goldfish_domain::{AccessToken, GoldfishError, Result, Source, TaskCandidate};
use tokio::sync::Notify;

/// Adapter that replays queued responses, repeating the last one.
pub struct ScriptedAdapter {
    source: Source,
    responses: Mutex<VecDeque<Result<Vec<TaskCandidate>>>>,
    last: Mutex<Option<Result<Vec<TaskCandidate>>>>,
    calls: AtomicUsize,
    seen_tokens: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedAdapter {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            seen_tokens: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn returning(self, candidates: Vec<TaskCandidate>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(candidates));
        self
    }

    pub fn failing(self, error: GoldfishError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Block every fetch until the gate is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch_assignments(
        &self,
        credential: Option<&AccessToken>,
    ) -> Result<Vec<TaskCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let token = goldfish_core::require_credential(self.source, credential)?;
        self.seen_tokens.lock().unwrap().push(token.expose().to_string());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => {
                *self.last.lock().unwrap() = Some(response.clone());
                response
            }
            None => self.last.lock().unwrap().clone().unwrap_or_else(|| Ok(Vec::new())),
        }
    }
}
