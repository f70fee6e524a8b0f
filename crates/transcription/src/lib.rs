pub mod asr;
pub mod buffer;
pub mod gateway;
pub mod pcm;

pub use asr::{
    AsrBackend, TranscriptSegment, TranscriptionMode, TranscriptionRequest, TranscriptionResult,
};
pub use buffer::AudioBuffer;
pub use gateway::{InferenceError, InferenceGateway};
