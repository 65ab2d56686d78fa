use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::store::SessionToken;
use crate::State;

/// Request header carrying the session token.
pub const SESSION_HEADER: &str = "x-session";
/// Response header echoing the resolved user's display name.
pub const USER_HEADER: &str = "x-user";

/// The caller's resolved identity for one request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub token: SessionToken,
    pub user: String,
}

/// Authenticate a request from its session header.
pub fn authenticate(state: &State, headers: &HeaderMap) -> Result<Identity, AuthError> {
    let raw = headers
        .get(SESSION_HEADER)
        .ok_or(AuthError::MissingSession)?
        .to_str()
        .map_err(|_| AuthError::BadToken)?;
    let token: SessionToken = raw.parse().map_err(|_| AuthError::BadToken)?;
    let user = state
        .store()
        .lookup_session(&token)
        .ok_or(AuthError::InvalidSession)?;
    Ok(Identity { token, user })
}

/// Attach the identity echo headers to a response.
pub fn with_identity(identity: &Identity, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(identity.token.as_str()) {
        headers.insert(SESSION_HEADER, value);
    }
    if let Ok(value) = HeaderValue::from_str(&identity.user) {
        headers.insert(USER_HEADER, value);
    }
    response
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing session header")]
    MissingSession,
    #[error("unparseable session token")]
    BadToken,
    #[error("invalid or expired session")]
    InvalidSession,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (http::StatusCode::UNAUTHORIZED, self.to_string()).into_response()
    }
}
