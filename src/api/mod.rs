// src/api/mod.rs
//! Read-only HTTP surface over the review refresher.

pub mod server;

pub use server::{router, ApiServer, AppState};

use crate::error::ReviewError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};

impl ReviewError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::EmptyStoreError => StatusCode::SERVICE_UNAVAILABLE,
            ReviewError::FeedFetchError(_) | ReviewError::FeedParseError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if self.is_recoverable() {
            warn!("Request failed with {}: {}", status, self);
        } else {
            error!("Request failed with {}: {}", status, self);
        }
        (status, self.to_string()).into_response()
    }
}
