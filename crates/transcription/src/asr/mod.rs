#[cfg(feature = "local-whisper")]
pub mod local_whisper;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Whether a transcription request is a mid-stream best effort or the
/// response to an explicit end-of-stream signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptionMode {
    Partial,
    Final,
}

impl TranscriptionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptionMode::Partial => "partial",
            TranscriptionMode::Final => "final",
        }
    }
}

/// Request to transcribe a snapshot of buffered audio.
///
/// Immutable after creation: the session hands the snapshot over and the
/// gateway never writes back into it.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    /// Raw audio, 16-bit little-endian PCM, 16kHz mono.
    pub audio_pcm16le: Vec<u8>,
    pub mode: TranscriptionMode,
    /// Optional language hint (ISO 639-1, e.g. "en", "nl").
    pub language_hint: Option<String>,
}

/// One timed segment of a transcription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub text: String,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// Result of an engine transcription call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptionResult {
    pub text: String,
    /// Language reported by the engine, if any.
    pub language: Option<String>,
    /// Timed segments, in stream order. May be empty for silent audio.
    pub segments: Vec<TranscriptSegment>,
}

/// Trait for pluggable ASR backends.
#[async_trait]
pub trait AsrBackend: Send + Sync + 'static {
    /// Transcribes one audio snapshot.
    async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> anyhow::Result<TranscriptionResult>;

    /// Human-readable backend name.
    fn name(&self) -> &str;
}
