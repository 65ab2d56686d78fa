use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::http_server::auth::{authenticate, with_identity, AuthError};
use crate::listing::{self, DirNode};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub roots: Vec<DirNode>,
}

/// The pruned tree of documents reachable through the caller's grants.
pub async fn handler(
    State(state): State<crate::State>,
    headers: HeaderMap,
) -> Result<Response, AuthError> {
    let identity = authenticate(&state, &headers)?;
    let user = identity.user.clone();
    let store = state.store_handle();
    // The walk touches the filesystem; keep it off the async workers.
    let roots = tokio::task::spawn_blocking(move || listing::list_for_user(&store, &user))
        .await
        .unwrap_or_default();
    let body = axum::Json(ListResponse { roots });
    Ok(with_identity(&identity, (http::StatusCode::OK, body)))
}
