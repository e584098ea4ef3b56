use axum::{
    extract::{
        rejection::QueryRejection,
        ws::{rejection::WebSocketUpgradeRejection, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::error::AppError;
use crate::group::{generate_display_name, GroupHandle};
use crate::server::AppState;

use super::endpoint::split_socket;
use super::session::run_session;

#[derive(Debug, Deserialize)]
pub struct RoomQuery {
    pub room: Option<String>,
}

impl RoomQuery {
    /// The requested room name, if present and non-empty
    pub fn room_name(&self) -> Option<&str> {
        self.room.as_deref().filter(|name| !name.is_empty())
    }
}

/// WebSocket upgrade handler for `GET /room?room=<name>`.
///
/// The room parameter is checked before anything else so a bad request never
/// creates a group or a member.
#[tracing::instrument(name = "ws.upgrade", skip_all)]
pub async fn room_handler(
    State(state): State<AppState>,
    query: Result<Query<RoomQuery>, QueryRejection>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let room = query
        .ok()
        .and_then(|Query(q)| q.room_name().map(str::to_owned))
        .ok_or_else(|| AppError::Validation("Missing room parameter".to_string()))?;

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(room = %room, error = %rejection, "WebSocket upgrade rejected");
            return Ok(rejection.into_response());
        }
    };

    let group = state.registry.get_or_create(&room);
    let name = generate_display_name();
    let queue_capacity = state.registry.settings().message_buffer_size;

    tracing::info!(room = %room, member_name = %name, "WebSocket upgrade requested");

    Ok(ws
        .read_buffer_size(state.settings.websocket.read_buffer_size)
        .write_buffer_size(state.settings.websocket.write_buffer_size)
        .on_upgrade(move |socket| handle_socket(socket, group, name, queue_capacity)))
}

async fn handle_socket(socket: WebSocket, group: GroupHandle, name: String, queue_capacity: usize) {
    let (sink, source) = split_socket(socket);
    run_session(group, name, queue_capacity, source, sink).await;
}
