use axum::routing::{get, post};
use axum::Router;

pub mod list;
pub mod login;
pub mod logout;
pub mod session;
pub mod sheet;

use crate::State;

pub fn router(state: State) -> Router<State> {
    Router::new()
        .route("/session", get(session::handler))
        .route("/login", post(login::handler))
        .route("/logout", post(logout::handler))
        .route("/list", get(list::handler))
        .nest("/sheet", sheet::router(state.clone()))
        .with_state(state)
}
