use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::{Sink, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use voxstream_config::Settings;
use voxstream_transcription::gateway::InferenceError;
use voxstream_transcription::{
    InferenceGateway, TranscriptionMode, TranscriptionRequest, TranscriptionResult,
};

use super::emitter::ResultEmitter;
use super::protocol::{self, Inbound};
use super::scheduler::PartialScheduler;

/// Lifecycle of one connection's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Receiving audio, eligible for partial triggers.
    Active,
    /// Processing an audio-end event; ticks are skipped until the final
    /// result has been emitted and the buffer flushed.
    Finalizing,
    /// Terminal. No further events are processed and nothing is emitted.
    Closed,
}

/// Events injected into the session loop alongside the socket stream.
#[derive(Debug)]
pub enum SessionEvent {
    /// The partial scheduler asks for a mid-stream transcription.
    PartialTick,
    /// An off-path partial inference call finished. `generation` is the
    /// buffer generation the snapshot was taken from; a mismatch means the
    /// buffer has been flushed since and the result is stale.
    PartialDone {
        generation: u64,
        outcome: Result<TranscriptionResult, InferenceError>,
    },
}

/// Buffering and trigger policy for a session, fixed at connection time.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub partial_interval: Duration,
    /// Byte count that triggers a mid-stream transcription + trim. None
    /// disables the sliding window (whole-session buffering).
    pub chunk_threshold_bytes: Option<usize>,
    pub trailing_window_bytes: usize,
    pub output: voxstream_config::OutputMode,
    pub language_hint: Option<String>,
}

impl SessionPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            partial_interval: Duration::from_secs_f64(settings.session.partial_interval_secs),
            chunk_threshold_bytes: settings.session.chunk_threshold_bytes,
            trailing_window_bytes: settings.session.trailing_window_bytes,
            output: settings.session.output,
            language_hint: settings.engine.language.clone(),
        }
    }
}

/// Per-connection state machine wiring ingestion, buffering, triggers and
/// result emission together.
///
/// Owns every piece of session state — buffer, sticky language, in-flight
/// flag — and is the only thing that mutates them. Inference runs off-path
/// through the gateway: partials as spawned tasks reporting back through
/// the event channel, finals awaited in place at the `Finalizing` point.
///
/// At most one inference call per session is outstanding at any time.
/// Triggers that fire while one is in flight are skipped, never queued;
/// that single-in-flight rule is the backpressure bound for slow engines.
pub struct SessionController<S> {
    connection_id: String,
    state: SessionState,
    buffer: voxstream_transcription::AudioBuffer,
    /// First non-empty language any result reported; reused for every
    /// later result in the session ("sticky").
    detected_language: Option<String>,
    inference_in_flight: bool,
    gateway: Arc<InferenceGateway>,
    policy: SessionPolicy,
    emitter: ResultEmitter<S>,
    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: Option<mpsc::Receiver<SessionEvent>>,
}

impl<S> SessionController<S>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    pub fn new(
        connection_id: String,
        gateway: Arc<InferenceGateway>,
        policy: SessionPolicy,
        emitter: ResultEmitter<S>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(32);
        Self {
            connection_id,
            state: SessionState::Active,
            buffer: voxstream_transcription::AudioBuffer::new(),
            detected_language: None,
            inference_in_flight: false,
            gateway,
            policy,
            emitter,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Drives the session until the socket closes or fails.
    ///
    /// On exit the partial scheduler has been cancelled *and awaited*, so
    /// no message is ever emitted for this session afterwards. An in-flight
    /// inference call is not awaited; its result lands in a channel nobody
    /// reads and is dropped.
    pub async fn run<R>(mut self, mut inbound: R)
    where
        R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    {
        let Some(mut events_rx) = self.events_rx.take() else {
            return;
        };

        let scheduler =
            PartialScheduler::spawn(self.policy.partial_interval, self.events_tx.clone());

        loop {
            tokio::select! {
                frame = inbound.next() => match frame {
                    Some(Ok(message)) => {
                        if !self.handle_frame(message, &mut events_rx).await {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(connection_id = %self.connection_id, %e, "WebSocket transport error");
                        break;
                    }
                    None => break,
                },
                Some(event) = events_rx.recv() => self.handle_event(event).await,
            }
        }

        scheduler.shutdown().await;
        self.state = SessionState::Closed;
        debug!(connection_id = %self.connection_id, "session closed, buffer discarded");
    }

    /// Processes one inbound frame. Returns false when the session should
    /// shut down.
    async fn handle_frame(
        &mut self,
        message: Message,
        events_rx: &mut mpsc::Receiver<SessionEvent>,
    ) -> bool {
        match message {
            Message::Text(text) => match protocol::decode_text(&text) {
                Ok(Inbound::Audio(chunk)) => self.on_audio(&chunk),
                Ok(Inbound::End { replacement }) => self.finalize(replacement, events_rx).await,
                Ok(Inbound::Unknown(kind)) => {
                    debug!(connection_id = %self.connection_id, kind = %kind, "ignoring unknown message kind");
                }
                Err(e) => {
                    warn!(connection_id = %self.connection_id, %e, "dropping undecodable frame");
                }
            },
            Message::Binary(data) => self.on_audio(&data),
            Message::Ping(data) => self.emitter.pong(data).await,
            Message::Pong(_) => {}
            Message::Close(_) => return false,
        }
        true
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::PartialTick => {
                if self.state != SessionState::Active {
                    return;
                }
                if self.inference_in_flight {
                    debug!(
                        connection_id = %self.connection_id,
                        "partial tick skipped, inference already in flight"
                    );
                    return;
                }
                if self.buffer.is_empty() {
                    return;
                }
                self.spawn_partial();
            }
            SessionEvent::PartialDone {
                generation,
                outcome,
            } => {
                self.inference_in_flight = false;
                if generation != self.buffer.generation() {
                    debug!(
                        connection_id = %self.connection_id,
                        generation,
                        current = self.buffer.generation(),
                        "discarding stale partial result"
                    );
                    return;
                }
                match outcome {
                    Ok(result) => {
                        if result.text.is_empty() {
                            debug!(connection_id = %self.connection_id, "empty partial suppressed");
                            return;
                        }
                        self.merge_language(result.language.as_deref());
                        let language = self.detected_language.clone();
                        self.emitter
                            .transcript(&result, true, language.as_deref())
                            .await;
                    }
                    Err(e) => {
                        warn!(connection_id = %self.connection_id, %e, "partial transcription failed");
                        self.emitter.error(&e.to_string()).await;
                    }
                }
            }
        }
    }

    /// Appends a decoded chunk and applies the chunk-threshold policy.
    fn on_audio(&mut self, chunk: &[u8]) {
        self.buffer.append(chunk);

        let Some(threshold) = self.policy.chunk_threshold_bytes else {
            return;
        };
        // If a call is already in flight the trigger is not queued; the
        // threshold is still crossed on the next append, so it fires as
        // soon as the session is idle again.
        if self.buffer.len() >= threshold && !self.inference_in_flight {
            debug!(
                connection_id = %self.connection_id,
                buffered = self.buffer.len(),
                threshold,
                "chunk threshold crossed, triggering mid-stream transcription"
            );
            self.spawn_partial();
            self.buffer.trim(self.policy.trailing_window_bytes);
        }
    }

    /// Requests a partial transcription over a non-destructive snapshot.
    ///
    /// The call runs off the event path; its result comes back as a
    /// `PartialDone` event tagged with the snapshot's buffer generation.
    fn spawn_partial(&mut self) {
        let request = TranscriptionRequest {
            audio_pcm16le: self.buffer.snapshot(),
            mode: TranscriptionMode::Partial,
            language_hint: self.language_hint(),
        };
        let generation = self.buffer.generation();
        let gateway = Arc::clone(&self.gateway);
        let events_tx = self.events_tx.clone();

        self.inference_in_flight = true;
        tokio::spawn(async move {
            let outcome = gateway.transcribe(request).await;
            if events_tx
                .send(SessionEvent::PartialDone {
                    generation,
                    outcome,
                })
                .await
                .is_err()
            {
                debug!("session closed before partial result could be delivered");
            }
        });
    }

    /// Handles audio-end: runs the final transcription and flushes.
    ///
    /// The final is awaited in place — the session processes nothing else
    /// until it has been emitted, which is exactly the ordering guarantee:
    /// the final reflects every chunk processed before the audio-end, and
    /// no later event can overtake it. Inbound frames that arrive in the
    /// meantime queue on the socket and are processed afterwards; the
    /// protocol allows further streaming on the same connection.
    async fn finalize(
        &mut self,
        replacement: Option<Vec<u8>>,
        events_rx: &mut mpsc::Receiver<SessionEvent>,
    ) {
        self.state = SessionState::Finalizing;

        // At most one request may be outstanding per session, so an
        // in-flight partial is drained first. Its result (computed from
        // pre-final audio) is still emitted, before the final.
        while self.inference_in_flight {
            match events_rx.recv().await {
                Some(event) => self.handle_event(event).await,
                None => break,
            }
        }

        if let Some(payload) = replacement {
            self.buffer.replace(&payload);
        }

        let outcome = if self.buffer.is_empty() {
            // Nothing was streamed; the final transcript of silence is "".
            Ok(TranscriptionResult::default())
        } else {
            let request = TranscriptionRequest {
                audio_pcm16le: self.buffer.snapshot(),
                mode: TranscriptionMode::Final,
                language_hint: self.language_hint(),
            };
            self.gateway.transcribe(request).await
        };

        match outcome {
            Ok(result) => {
                self.merge_language(result.language.as_deref());
                let language = self.detected_language.clone();
                self.emitter
                    .transcript(&result, false, language.as_deref())
                    .await;
                self.buffer.clear();
            }
            Err(e) => {
                // "No text this round": the buffer survives, so the client
                // can retry the audio-end without re-streaming.
                warn!(connection_id = %self.connection_id, %e, "final transcription failed");
                self.emitter.error(&e.to_string()).await;
            }
        }

        self.state = SessionState::Active;
    }

    /// The hint sent to the engine: once a language has stuck for the
    /// session it also steers subsequent calls.
    fn language_hint(&self) -> Option<String> {
        self.detected_language
            .clone()
            .or_else(|| self.policy.language_hint.clone())
    }

    fn merge_language(&mut self, reported: Option<&str>) {
        if self.detected_language.is_some() {
            return;
        }
        if let Some(language) = reported
            && !language.is_empty()
        {
            info!(
                connection_id = %self.connection_id,
                language,
                "language detected for session"
            );
            self.detected_language = Some(language.to_string());
        }
    }
}
