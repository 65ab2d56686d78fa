use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::cache::ResolveError;
use crate::http_server::auth::{authenticate, with_identity, AuthError};

use super::{resolve_status, SheetView};

/// Fetch a document by `label/relative-path`, loading it into the cache
/// on first touch.
pub async fn handler(
    State(state): State<crate::State>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, FetchError> {
    let identity = authenticate(&state, &headers)?;
    let (entry, grant) = state
        .cache()
        .resolve(state.store(), &identity.user, &path)
        .await?;
    let body = axum::Json(SheetView::project(&entry, &grant));
    Ok(with_identity(&identity, (http::StatusCode::OK, body)))
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        match self {
            FetchError::Auth(e) => e.into_response(),
            FetchError::Resolve(e) => {
                tracing::debug!("sheet fetch failed: {e}");
                (resolve_status(&e), e.to_string()).into_response()
            }
        }
    }
}
