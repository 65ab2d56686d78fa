use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::http_server::auth::{authenticate, with_identity, AuthError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: String,
}

/// Session check: 401 unless the session header names a live session.
pub async fn handler(
    State(state): State<crate::State>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let identity = authenticate(&state, &headers)?;
    let body = axum::Json(SessionResponse {
        user: identity.user.clone(),
    });
    Ok(with_identity(&identity, (http::StatusCode::OK, body)))
}
