use std::sync::Arc;

use voxstream_config::Settings;
use voxstream_transcription::InferenceGateway;

use crate::ws::registry::SessionRegistry;

/// Shared application state handed to every request handler.
///
/// The gateway is None when no speech engine could be loaded at startup;
/// the server still runs, but each new WebSocket session is refused
/// individually (engine unavailability is fatal per-connection, never
/// process-wide).
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub gateway: Option<Arc<InferenceGateway>>,
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(settings: Settings, gateway: Option<Arc<InferenceGateway>>) -> Self {
        Self {
            settings: Arc::new(settings),
            gateway,
            registry: Arc::new(SessionRegistry::new()),
        }
    }
}
