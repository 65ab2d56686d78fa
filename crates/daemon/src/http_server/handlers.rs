use axum::response::IntoResponse;

pub async fn not_found_handler() -> impl IntoResponse {
    (http::StatusCode::NOT_FOUND, "Not Found")
}
