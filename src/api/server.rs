// src/api/server.rs
//! Axum router and server for the review endpoints.

use crate::error::ReviewError;
use crate::feed::{FeedRefresher, RefreshStatus};
use axum::{
    extract::{Query, State},
    http::{header::CONTENT_TYPE, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use log::{debug, info};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

/// Shared handler state.
///
/// The mutex serializes staleness checks, merges and file writes, so two
/// stale requests cannot both fetch and rewrite the store. `status` is read
/// without that lock.
#[derive(Clone)]
pub struct AppState {
    pub refresher: Arc<Mutex<FeedRefresher>>,
    pub status: Arc<RefreshStatus>,
}

impl AppState {
    pub fn new(refresher: FeedRefresher) -> Self {
        let status = refresher.status();
        Self {
            refresher: Arc::new(Mutex::new(refresher)),
            status,
        }
    }
}

pub struct ApiServer {
    bind_address: String,
    state: AppState,
}

impl ApiServer {
    pub fn new(bind_address: impl Into<String>, refresher: FeedRefresher) -> Self {
        Self {
            bind_address: bind_address.into(),
            state: AppState::new(refresher),
        }
    }

    /// Binds and serves until the process is stopped.
    pub async fn start(self) -> Result<(), ReviewError> {
        let app = router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(&self.bind_address)
            .await
            .map_err(|e| ReviewError::ServerError(format!("Failed to bind {}: {}", self.bind_address, e)))?;

        info!("Review API listening on {}", self.bind_address);
        info!("Serving random reviews at /api/v1/random");

        axum::serve(listener, app)
            .await
            .map_err(|e| ReviewError::ServerError(e.to_string()))
    }
}

/// Builds the router. CORS is open to every origin on the `/api/v1` routes.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([CONTENT_TYPE]);

    let api = Router::new()
        .route("/api/v1/random", get(random_review))
        .route("/api/v1/review", get(review_by_title))
        .layer(cors);

    Router::new()
        .merge(api)
        .route("/health", get(health_check))
        .with_state(state)
}

async fn random_review(State(state): State<AppState>) -> Result<String, ReviewError> {
    let mut refresher = state.refresher.lock().await;
    refresher.get_random_review().await
}

#[derive(Debug, Deserialize)]
struct TitleQuery {
    title: Option<String>,
}

async fn review_by_title(
    State(state): State<AppState>,
    Query(query): Query<TitleQuery>,
) -> Result<Response, ReviewError> {
    let Some(title) = query.title.filter(|t| !t.is_empty()) else {
        return Ok((StatusCode::BAD_REQUEST, "Missing 'title' query parameter").into_response());
    };

    let mut refresher = state.refresher.lock().await;
    match refresher.get_review_from_title(&title).await? {
        Some(review) => Ok(review.to_string().into_response()),
        None => {
            debug!("No review found for title {:?}", title);
            Ok((StatusCode::NOT_FOUND, format!("No review found for title: {}", title)).into_response())
        }
    }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "reviews": state.status.reviews(),
        "last_refreshed_secs_ago": state.status.last_refreshed_at().map(|at| at.elapsed().as_secs()),
        "timestamp": chrono::Utc::now().timestamp()
    }))
}
