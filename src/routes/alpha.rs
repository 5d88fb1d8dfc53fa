use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::IntoResponse,
};

use crate::startup::AppState;

/// Sends `/alpha` and everything below it to the alpha application.
#[tracing::instrument(name = "Redirecting to alpha", skip(state))]
pub async fn alpha_redirect(State(state): State<AppState>, uri: Uri) -> impl IntoResponse {
    let location = state.alpha.target(uri.path(), uri.query());
    (StatusCode::FOUND, [(header::LOCATION, location)])
}
