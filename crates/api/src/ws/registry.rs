use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Tracks the currently open WebSocket sessions by connection ID.
///
/// Purely observational: session state itself lives in each connection's
/// own controller and is never shared here.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Instant>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, connection_id: String) {
        self.sessions.insert(connection_id, Instant::now());
    }

    /// Removes a session, returning how long it was open.
    pub fn remove(&self, connection_id: &str) -> Option<Duration> {
        self.sessions
            .remove(connection_id)
            .map(|(_, opened_at)| opened_at.elapsed())
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }
}
