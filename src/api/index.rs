//! Client page served at `/`.

use std::io::ErrorKind;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::error::Result;
use crate::server::AppState;

pub async fn index(State(state): State<AppState>) -> Result<Response> {
    match tokio::fs::read_to_string(&state.settings.server.index_path).await {
        Ok(page) => Ok(Html(page).into_response()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %state.settings.server.index_path, "Index page missing");
            Ok((StatusCode::NOT_FOUND, Html("index.html not found")).into_response())
        }
        Err(e) => Err(e.into()),
    }
}
