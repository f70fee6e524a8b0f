use axum::body::Bytes;
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use tracing::warn;
use voxstream_config::OutputMode;
use voxstream_transcription::TranscriptionResult;

/// Writes transcript and error messages back to one connection.
///
/// Owned by the session's event loop, so two messages for the same
/// session always go out in the order their events were processed, even
/// though the inference calls themselves run off-path.
///
/// Generic over the sink so the state machine can be driven against an
/// in-memory channel in tests; production hands it the write half of the
/// split WebSocket.
pub struct ResultEmitter<S> {
    sink: S,
    output: OutputMode,
}

impl<S> ResultEmitter<S>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    pub fn new(sink: S, output: OutputMode) -> Self {
        Self { sink, output }
    }

    /// Emits one transcription result in the configured output shape.
    ///
    /// `language` is the session's sticky language, already merged by the
    /// caller; the engine's own per-call report is not trusted here.
    pub async fn transcript(
        &mut self,
        result: &TranscriptionResult,
        partial: bool,
        language: Option<&str>,
    ) {
        match self.output {
            OutputMode::WholeText => {
                self.send(serde_json::json!({
                    "type": "transcript",
                    "text": result.text,
                    "partial": partial,
                    "language": language,
                }))
                .await;
            }
            OutputMode::Segments => {
                for segment in &result.segments {
                    self.send(serde_json::json!({
                        "text": segment.text,
                        "start": segment.start_secs,
                        "end": segment.end_secs,
                    }))
                    .await;
                }
            }
        }
    }

    /// Reports a failed inference call for one request; the session stays
    /// active and the buffer is untouched.
    pub async fn error(&mut self, message: &str) {
        self.send(serde_json::json!({
            "type": "error",
            "message": message,
        }))
        .await;
    }

    pub async fn pong(&mut self, data: Bytes) {
        if let Err(e) = self.sink.send(Message::Pong(data)).await {
            warn!(%e, "Failed to send WS pong");
        }
    }

    async fn send(&mut self, payload: serde_json::Value) {
        if let Err(e) = self.sink.send(Message::text(payload.to_string())).await {
            warn!(%e, "Failed to send WS message");
        }
    }
}
