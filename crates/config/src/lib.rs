use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level settings for the voxstream server.
///
/// Loaded from an optional `voxstream.toml` in the working directory,
/// overridden by `VOXSTREAM__SECTION__FIELD` environment variables
/// (e.g. `VOXSTREAM__SERVER__PORT=9001`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub engine: EngineSettings,
    pub session: SessionSettings,
    pub inference: InferenceSettings,
}

/// Bind address for the HTTP/WebSocket listener.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8765,
        }
    }
}

/// Speech engine selection and model parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// ASR backend to use: "local_whisper".
    pub backend: String,
    /// Path to the GGML model file (for local_whisper).
    pub model_path: Option<String>,
    /// Compute device: "cpu" or "cuda".
    pub device: String,
    /// Compute precision: "fp16" or "fp32".
    pub precision: String,
    /// Fixed language hint (ISO 639-1, e.g. "en", "nl"). None = auto-detect.
    pub language: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            backend: "local_whisper".to_string(),
            model_path: None,
            device: "cpu".to_string(),
            precision: "fp16".to_string(),
            language: None,
        }
    }
}

/// Per-session buffering and trigger policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Seconds between partial transcription triggers.
    pub partial_interval_secs: f64,
    /// Byte count at which a mid-stream transcription is triggered and the
    /// buffer is trimmed. None disables the sliding window: the whole
    /// session is buffered until audio-end.
    pub chunk_threshold_bytes: Option<usize>,
    /// Bytes kept after a chunk-threshold trim.
    pub trailing_window_bytes: usize,
    /// Shape of outbound transcript messages.
    pub output: OutputMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            partial_interval_secs: 3.0,
            chunk_threshold_bytes: None,
            trailing_window_bytes: 6000,
            output: OutputMode::WholeText,
        }
    }
}

/// Outbound transcript message shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// One `{"type":"transcript",...}` message per result.
    #[default]
    WholeText,
    /// One `{"text","start","end"}` message per timed segment.
    Segments,
}

/// Inference worker pool limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    /// Maximum concurrent engine calls process-wide.
    pub workers: usize,
    /// Upper bound on a single engine call, in seconds.
    pub timeout_secs: u64,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("voxstream").required(false))
            .add_source(Environment::with_prefix("VOXSTREAM").separator("__"))
            .build()?
            .try_deserialize()
    }
}
