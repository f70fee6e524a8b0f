#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use voxstream_transcription::{
    AsrBackend, InferenceGateway, TranscriptSegment, TranscriptionRequest, TranscriptionResult,
};

/// Scripted ASR backend: records every request, replays queued responses,
/// and can be gated so calls block until the test releases them.
pub struct MockBackend {
    calls: Mutex<Vec<TranscriptionRequest>>,
    responses: Mutex<VecDeque<anyhow::Result<TranscriptionResult>>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            gate: None,
        })
    }

    /// A backend whose calls block until permits are added to the gate.
    pub fn gated() -> (Arc<Self>, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let backend = Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(VecDeque::new()),
            gate: Some(gate.clone()),
        });
        (backend, gate)
    }

    pub fn push_response(&self, response: anyhow::Result<TranscriptionResult>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<TranscriptionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Polls until the backend has seen `count` calls, or panics.
    pub async fn wait_for_calls(&self, count: usize) {
        for _ in 0..200 {
            if self.call_count() >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "backend never reached {} calls (saw {})",
            count,
            self.call_count()
        );
    }
}

#[async_trait]
impl AsrBackend for MockBackend {
    async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> anyhow::Result<TranscriptionResult> {
        self.calls.lock().unwrap().push(request);
        if let Some(gate) = &self.gate {
            let permit = gate.acquire().await.expect("gate closed");
            permit.forget();
        }
        match self.responses.lock().unwrap().pop_front() {
            Some(response) => response,
            None => Ok(result("mock transcript", None)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

pub fn result(text: &str, language: Option<&str>) -> TranscriptionResult {
    TranscriptionResult {
        text: text.to_string(),
        language: language.map(str::to_string),
        segments: Vec::new(),
    }
}

pub fn timed_result(text: &str, segments: &[(&str, f64, f64)]) -> TranscriptionResult {
    TranscriptionResult {
        text: text.to_string(),
        language: None,
        segments: segments
            .iter()
            .map(|(text, start, end)| TranscriptSegment {
                text: text.to_string(),
                start_secs: *start,
                end_secs: *end,
            })
            .collect(),
    }
}

pub fn gateway(backend: Arc<MockBackend>) -> Arc<InferenceGateway> {
    Arc::new(InferenceGateway::new(
        backend,
        4,
        Duration::from_secs(10),
    ))
}
