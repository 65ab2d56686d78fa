use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::cache::ResolveError;
use crate::http_server::auth::{authenticate, with_identity, AuthError};

use super::resolve_status;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveResponse {
    /// False when the document was already clean and nothing was written.
    pub saved: bool,
}

/// Persist a document back to its file. Writes only when dirty, so a
/// second save with no intervening edit is a no-op.
pub async fn handler(
    State(state): State<crate::State>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, SaveError> {
    let identity = authenticate(&state, &headers)?;
    let (entry, grant) = state
        .cache()
        .resolve(state.store(), &identity.user, &path)
        .await?;
    if grant.read_only {
        return Err(SaveError::ReadOnly);
    }

    let saved = state
        .cache()
        .save(&entry)
        .await
        .map_err(|e| SaveError::WriteFailed(entry.path.display().to_string(), e))?;
    if saved {
        tracing::info!(path = %entry.path.display(), "sheet saved");
    }

    let body = axum::Json(SaveResponse { saved });
    Ok(with_identity(&identity, (http::StatusCode::OK, body)))
}

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("access is read-only")]
    ReadOnly,
    #[error("failed to write {0}: {1}")]
    WriteFailed(String, #[source] ResolveError),
}

impl IntoResponse for SaveError {
    fn into_response(self) -> Response {
        match self {
            SaveError::Auth(e) => e.into_response(),
            SaveError::Resolve(e) => (resolve_status(&e), e.to_string()).into_response(),
            SaveError::ReadOnly => {
                (http::StatusCode::FORBIDDEN, self.to_string()).into_response()
            }
            SaveError::WriteFailed(path, e) => {
                tracing::error!(%path, "sheet save failed: {e}");
                (
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    format!("failed to write {path}: {e}"),
                )
                    .into_response()
            }
        }
    }
}
