use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::asr::{AsrBackend, TranscriptionRequest, TranscriptionResult};

/// Failure of a single engine call. Never fatal for the session: callers
/// treat it as "no text this round" and keep their buffer state.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference engine failed: {0}")]
    Engine(String),
    #[error("inference call exceeded {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("inference gateway is shutting down")]
    Unavailable,
}

/// Gated access to the shared speech engine.
///
/// The underlying engine instance is shared by every session in the
/// process and is CPU/GPU-bound, so calls are bounded by a semaphore:
/// `workers` permits, one per concurrent engine call (1 = fully
/// serialized). Each call is capped at `call_timeout`; an overrunning
/// call is reported as [`InferenceError::Timeout`] and releases its slot —
/// the engine may still finish the work internally, but the result is
/// discarded.
///
/// The gateway itself never runs on a connection's event path; sessions
/// either spawn the call (partials) or suspend on it at an explicit
/// finalization point.
pub struct InferenceGateway {
    backend: Arc<dyn AsrBackend>,
    permits: Semaphore,
    call_timeout: Duration,
}

impl InferenceGateway {
    pub fn new(backend: Arc<dyn AsrBackend>, workers: usize, call_timeout: Duration) -> Self {
        Self {
            backend,
            permits: Semaphore::new(workers.max(1)),
            call_timeout,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Runs one transcription through the engine, waiting for a worker slot.
    pub async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> Result<TranscriptionResult, InferenceError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| InferenceError::Unavailable)?;

        let mode = request.mode;
        let audio_bytes = request.audio_pcm16le.len();
        let started = Instant::now();

        match tokio::time::timeout(self.call_timeout, self.backend.transcribe(request)).await {
            Ok(Ok(result)) => {
                debug!(
                    mode = mode.as_str(),
                    audio_bytes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    text_len = result.text.len(),
                    "inference complete"
                );
                Ok(result)
            }
            Ok(Err(e)) => Err(InferenceError::Engine(e.to_string())),
            Err(_) => Err(InferenceError::Timeout(self.call_timeout)),
        }
    }
}
