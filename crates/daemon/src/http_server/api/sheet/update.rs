use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};

use crate::cache::{CachedSheet, ResolveError};
use crate::fields::{self, FieldUpdate, ValidationError};
use crate::http_server::auth::{authenticate, with_identity, AuthError};

use super::{resolve_status, SheetView};

/// Apply one field edit to a document and republish it.
///
/// A request has logical exclusive use of its document for the duration
/// of the edit; the cache lock protects the map, not the mutation.
pub async fn handler(
    State(state): State<crate::State>,
    Path(path): Path<String>,
    headers: HeaderMap,
    Json(update): Json<FieldUpdate>,
) -> Result<Response, UpdateError> {
    let identity = authenticate(&state, &headers)?;
    let (entry, grant) = state
        .cache()
        .resolve(state.store(), &identity.user, &path)
        .await?;
    if grant.read_only {
        return Err(UpdateError::ReadOnly);
    }

    let mut sheet = entry.sheet.clone();
    let changed = fields::apply(&mut sheet, &update)?;

    let entry = if changed {
        sheet.mark_modified();
        let current_sum = sheet.checksum();
        let updated = Arc::new(CachedSheet {
            client_path: entry.client_path.clone(),
            path: entry.path.clone(),
            sheet,
            loaded_sum: entry.loaded_sum,
            current_sum,
        });
        state.cache().republish(updated.clone());
        tracing::debug!(path = %updated.path.display(), key = %update.key, "field updated");
        updated
    } else {
        entry
    };

    let body = axum::Json(SheetView::project(&entry, &grant));
    Ok(with_identity(&identity, (http::StatusCode::OK, body)))
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("access is read-only")]
    ReadOnly,
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl IntoResponse for UpdateError {
    fn into_response(self) -> Response {
        match self {
            UpdateError::Auth(e) => e.into_response(),
            UpdateError::Resolve(e) => (resolve_status(&e), e.to_string()).into_response(),
            UpdateError::ReadOnly => {
                (http::StatusCode::FORBIDDEN, self.to_string()).into_response()
            }
            UpdateError::Validation(e) => {
                (http::StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
        }
    }
}
