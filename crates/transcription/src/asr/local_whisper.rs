use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use super::{AsrBackend, TranscriptSegment, TranscriptionMode, TranscriptionRequest, TranscriptionResult};
use crate::pcm;

/// Get the language string for a whisper language ID.
fn whisper_lang_str(lang_id: i32) -> Option<String> {
    whisper_rs::get_lang_str(lang_id).map(|s| s.to_string())
}

/// Local Whisper ASR backend using whisper.cpp via whisper-rs.
pub struct LocalWhisperBackend {
    ctx: Arc<WhisperContext>,
}

impl LocalWhisperBackend {
    /// Creates a new Whisper backend, loading the model from disk.
    ///
    /// `model_path` should point to a GGML Whisper model file (e.g.
    /// ggml-tiny.bin). `device` selects GPU offload ("cuda") or CPU.
    /// whisper.cpp derives its compute type from the model weights, so the
    /// configured precision is recorded but not applied here.
    pub fn new(model_path: &str, device: &str, precision: &str) -> anyhow::Result<Self> {
        info!(model_path, device, precision, "Loading Whisper model");

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu = matches!(device, "cuda" | "gpu");

        let ctx = WhisperContext::new_with_params(model_path, ctx_params)
            .map_err(|e| anyhow::anyhow!("Failed to load Whisper model '{}': {}", model_path, e))?;
        info!("Whisper model loaded");
        Ok(Self { ctx: Arc::new(ctx) })
    }
}

#[async_trait]
impl AsrBackend for LocalWhisperBackend {
    async fn transcribe(
        &self,
        request: TranscriptionRequest,
    ) -> anyhow::Result<TranscriptionResult> {
        let audio = pcm::pcm16le_to_f32(&request.audio_pcm16le);
        let lang = request.language_hint;
        let mode = request.mode;

        // whisper-rs is CPU-bound; run on the blocking thread pool. A fresh
        // state is created per call, so the context can be shared.
        let ctx = Arc::clone(&self.ctx);

        let result = tokio::task::spawn_blocking(move || -> anyhow::Result<TranscriptionResult> {
            let mut state = ctx
                .create_state()
                .map_err(|e| anyhow::anyhow!("Failed to create Whisper state: {}", e))?;

            // Partials are throwaway best-effort results: greedy decoding
            // keeps them cheap. Finals get the full beam search.
            let mut params = match mode {
                TranscriptionMode::Partial => {
                    FullParams::new(SamplingStrategy::Greedy { best_of: 1 })
                }
                TranscriptionMode::Final => FullParams::new(SamplingStrategy::BeamSearch {
                    beam_size: 5,
                    patience: 1.0,
                }),
            };

            if let Some(ref lang) = lang {
                params.set_language(Some(lang));
            } else {
                // Enable auto language detection when no hint is provided
                params.set_detect_language(true);
            }

            // Always transcribe in the source language (never translate to English)
            params.set_translate(false);

            // Suppress non-speech output
            params.set_print_progress(false);
            params.set_print_special(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            // Allow multi-segment for better accuracy
            params.set_single_segment(false);
            params.set_no_speech_thold(0.6);
            params.set_suppress_blank(true);

            state
                .full(params, &audio)
                .map_err(|e| anyhow::anyhow!("Whisper transcription failed: {}", e))?;

            let n_segments = state.full_n_segments();

            let mut text = String::new();
            let mut segments = Vec::new();
            for i in 0..n_segments {
                if let Some(segment) = state.get_segment(i)
                    && let Ok(seg_text) = segment.to_str()
                {
                    text.push_str(seg_text);
                    segments.push(TranscriptSegment {
                        text: seg_text.trim().to_string(),
                        // whisper timestamps are in centiseconds
                        start_secs: segment.start_timestamp() as f64 / 100.0,
                        end_secs: segment.end_timestamp() as f64 / 100.0,
                    });
                }
            }

            let text = text.trim().to_string();

            // Detect language from whisper state (auto-detected by the model)
            let detected_lang = whisper_lang_str(state.full_lang_id_from_state()).or(lang);

            debug!(
                mode = mode.as_str(),
                text_len = text.len(),
                ?detected_lang,
                "Whisper transcription complete"
            );

            Ok(TranscriptionResult {
                text,
                language: detected_lang,
                segments,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("Whisper task join error: {}", e))??;

        Ok(result)
    }

    fn name(&self) -> &str {
        "local_whisper"
    }
}
