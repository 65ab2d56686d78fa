use axum::extract::{Form, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::http_server::auth::{with_identity, Identity};
use crate::store::hash_password;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: String,
}

pub async fn handler(
    State(state): State<crate::State>,
    Form(req): Form<LoginRequest>,
) -> Result<Response, LoginError> {
    let Some((actual_name, stored_digest)) =
        state.store().lookup_user_name_and_password(&req.name)
    else {
        return Err(LoginError::BadCredentials);
    };
    if hash_password(&req.password) != stored_digest {
        tracing::debug!(user = %req.name, "login with wrong password");
        return Err(LoginError::BadCredentials);
    }

    let token = state.store().create_session(&actual_name);
    tracing::info!(user = %actual_name, "login");

    // New session state should survive a restart.
    if let Err(e) = state.flush_settings().await {
        tracing::warn!("failed to persist settings after login: {e}");
    }

    let identity = Identity {
        token,
        user: actual_name.clone(),
    };
    let body = axum::Json(LoginResponse { user: actual_name });
    Ok(with_identity(&identity, (http::StatusCode::OK, body)))
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("unknown user or wrong password")]
    BadCredentials,
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        (http::StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}
