use axum::{
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

use super::emitter::ResultEmitter;
use super::session::{SessionController, SessionPolicy};

pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();

    let (sender, receiver) = socket.split();

    // Engine unavailability is fatal for this connection only: tell the
    // client and close, without touching any other session.
    let Some(gateway) = state.gateway.clone() else {
        warn!(%connection_id, "speech engine unavailable, refusing session");
        let mut sender = sender;
        let refusal = serde_json::json!({
            "type": "error",
            "message": "speech engine unavailable",
        });
        let _ = sender.send(Message::text(refusal.to_string())).await;
        let _ = sender.send(Message::Close(None)).await;
        return;
    };

    info!(%connection_id, "WebSocket connected");
    state.registry.add(connection_id.clone());

    let policy = SessionPolicy::from_settings(&state.settings);
    let emitter = ResultEmitter::new(sender, policy.output);
    let controller = SessionController::new(connection_id.clone(), gateway, policy, emitter);
    controller.run(receiver).await;

    let duration = state.registry.remove(&connection_id);
    info!(
        %connection_id,
        duration_secs = duration.map(|d| d.as_secs_f64()),
        "WebSocket disconnected"
    );
}
