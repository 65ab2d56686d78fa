use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use crate::http_server::auth::SESSION_HEADER;
use crate::store::SessionToken;

/// Invalidate the caller's session server-side. Succeeds even when the
/// header is missing or stale; logout is idempotent.
pub async fn handler(State(state): State<crate::State>, headers: HeaderMap) -> impl IntoResponse {
    let token = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.parse::<SessionToken>().ok());
    if let Some(token) = token {
        state.store().remove_session(&token);
        if let Err(e) = state.flush_settings().await {
            tracing::warn!("failed to persist settings after logout: {e}");
        }
    }
    http::StatusCode::OK
}
