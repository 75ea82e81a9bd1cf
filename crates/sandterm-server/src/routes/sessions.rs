//! Attached console listing.

use crate::state::AppState;
use axum::{extract::State, Json};
use sandterm_types::ConsoleSummary;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<ConsoleSummary>,
    pub active_count: usize,
    pub max_sessions: usize,
}

pub async fn list(State(state): State<Arc<AppState>>) -> Json<SessionListResponse> {
    let sessions = state.consoles();
    Json(SessionListResponse {
        active_count: sessions.len(),
        sessions,
        max_sessions: state.config.max_sessions,
    })
}
