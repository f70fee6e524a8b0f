use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};
use voxstream_api::state::AppState;
use voxstream_config::Settings;
use voxstream_transcription::InferenceGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings =
        Settings::load().map_err(|e| anyhow::anyhow!("failed to load settings: {e}"))?;

    let gateway = build_gateway(&settings);
    match &gateway {
        Some(gateway) => info!(backend = gateway.backend_name(), "inference gateway ready"),
        None => warn!("no inference gateway; incoming sessions will be refused"),
    }

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = AppState::new(settings, gateway);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "voxstream listening");

    axum::serve(listener, voxstream_api::build_router(state)).await?;
    Ok(())
}

/// Builds the gateway around the configured backend.
///
/// Returns None when the engine cannot be loaded; the server still comes
/// up and refuses sessions individually, mirroring the per-connection
/// fatality of engine unavailability.
fn build_gateway(settings: &Settings) -> Option<Arc<InferenceGateway>> {
    let backend: Arc<dyn voxstream_transcription::AsrBackend> =
        match settings.engine.backend.as_str() {
            #[cfg(feature = "local-whisper")]
            "local_whisper" => {
                let Some(model_path) = settings.engine.model_path.as_deref() else {
                    warn!("engine.model_path not configured");
                    return None;
                };
                match voxstream_transcription::asr::local_whisper::LocalWhisperBackend::new(
                    model_path,
                    &settings.engine.device,
                    &settings.engine.precision,
                ) {
                    Ok(backend) => Arc::new(backend),
                    Err(e) => {
                        warn!(%e, "failed to load Whisper model");
                        return None;
                    }
                }
            }
            other => {
                warn!(backend = %other, "unknown or disabled ASR backend");
                return None;
            }
        };

    Some(Arc::new(InferenceGateway::new(
        backend,
        settings.inference.workers,
        Duration::from_secs(settings.inference.timeout_secs),
    )))
}
