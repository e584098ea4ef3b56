//! Landing and chat pages.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::Html,
};

use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::template::Page;
use crate::websocket::RoomQuery;

/// GET / - landing page
pub async fn index_page(State(state): State<AppState>, headers: HeaderMap) -> Result<Html<String>> {
    render(&state, Page::Index, &headers, "").await
}

/// GET /chat?room=<name> - chat page for one room
pub async fn chat_page(
    State(state): State<AppState>,
    Query(query): Query<RoomQuery>,
    headers: HeaderMap,
) -> Result<Html<String>> {
    let room = query.room_name().unwrap_or_default().to_string();
    render(&state, Page::Chat, &headers, &room).await
}

async fn render(state: &AppState, page: Page, headers: &HeaderMap, room: &str) -> Result<Html<String>> {
    let host = request_host(headers, &state.settings.server_addr());
    let html = state
        .pages
        .render(page, &[("host", host.as_str()), ("room", room)])
        .await
        .map_err(|e| AppError::Template(e.to_string()))?;
    Ok(Html(html))
}

/// Host the browser used to reach us, falling back to the bind address
fn request_host(headers: &HeaderMap, fallback: &str) -> String {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| fallback.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_host_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("chat.example.com"));
        assert_eq!(request_host(&headers, "0.0.0.0:8080"), "chat.example.com");
    }

    #[test]
    fn test_request_host_fallback() {
        assert_eq!(request_host(&HeaderMap::new(), "0.0.0.0:8080"), "0.0.0.0:8080");
    }
}
