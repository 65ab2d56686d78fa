use axum::routing::get;
use axum::Router;

pub mod fetch;
mod projection;
pub mod save;
pub mod update;

pub use projection::SheetView;

use crate::cache::ResolveError;
use crate::State;

pub fn router(state: State) -> Router<State> {
    Router::new()
        .route(
            "/*path",
            get(fetch::handler).post(update::handler).put(save::handler),
        )
        .with_state(state)
}

/// Status code for a resolution failure, shared by every sheet endpoint:
/// unknown labels and unloadable documents read as absent (404), while a
/// malformed or escaping path is the client's mistake (400).
fn resolve_status(err: &ResolveError) -> http::StatusCode {
    match err {
        ResolveError::UnknownLabel(_) => http::StatusCode::NOT_FOUND,
        ResolveError::BadPath(_) => http::StatusCode::BAD_REQUEST,
        ResolveError::Storage(..) | ResolveError::Sheet(_) => http::StatusCode::NOT_FOUND,
        ResolveError::LoadCancelled => http::StatusCode::INTERNAL_SERVER_ERROR,
    }
}
