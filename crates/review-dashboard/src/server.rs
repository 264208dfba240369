//! HTTP front end of the dashboard.
//!
//! Serves the HTML dashboard (one in-process session) and a JSON API over
//! the same operations.
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::analysis::{BucketSentiment, ChartRow};
use crate::dashboard::Dashboard;
use crate::error::AppError;
use crate::harvest::BucketHarvest;
use crate::model::Product;
use crate::render;
use crate::session::Session;

/// Shared handler state. The HTML routes hold the session mutex for the whole
/// of an operation. Scraping is serialized inside the dashboard, so the JSON
/// routes never run a second search or browser alongside it.
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(dashboard: Dashboard) -> Self {
        Self {
            dashboard: Arc::new(dashboard),
            session: Arc::new(Mutex::new(Session::new())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub phrase: String,
    pub cache_age_secs: u64,
    pub products: Vec<Product>,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub product_id: String,
    pub buckets: Vec<BucketHarvest>,
    pub sentiment: Vec<BucketSentiment>,
    pub chart: Vec<ChartRow>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/search", post(search))
        .route("/refresh", post(refresh))
        .route("/products/{id}/reviews", post(fetch_reviews))
        .route("/back", post(go_back))
        .route("/api/search", get(api_search))
        .route("/api/products/{id}/reviews", get(api_reviews))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let session = state.session.lock().await;
    Html(render::page(&session))
}

async fn search(State(state): State<AppState>, Form(form): Form<SearchForm>) -> Redirect {
    let mut session = state.session.lock().await;
    state.dashboard.submit_search(&mut session, &form.q).await;
    Redirect::to("/")
}

async fn refresh(State(state): State<AppState>, Form(form): Form<SearchForm>) -> Redirect {
    let mut session = state.session.lock().await;
    state.dashboard.submit_refresh(&mut session, &form.q).await;
    Redirect::to("/")
}

async fn fetch_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    validate_product_id(&id)?;
    let mut session = state.session.lock().await;
    state.dashboard.fetch_reviews(&mut session, &id).await?;
    Ok(Redirect::to("/"))
}

async fn go_back(State(state): State<AppState>) -> Redirect {
    state.session.lock().await.go_back();
    Redirect::to("/")
}

async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchForm>,
) -> Result<Json<SearchResponse>, AppError> {
    let found = state.dashboard.search(&params.q).await?;
    Ok(Json(SearchResponse {
        cache_age_secs: found.age().as_secs(),
        products: found.outcome.products.into_values().collect(),
        pages_fetched: found.outcome.pages_fetched,
        pages_failed: found.outcome.pages_failed,
        skipped: found.outcome.skipped,
        phrase: found.phrase,
    }))
}

async fn api_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReviewsResponse>, AppError> {
    validate_product_id(&id)?;
    let analysis = state.dashboard.analyze(&id).await?;
    info!(product_id = %id, "review analysis served");
    Ok(Json(ReviewsResponse {
        chart: analysis.report.chart_rows(),
        sentiment: analysis.report.buckets,
        buckets: analysis.harvest.buckets,
        product_id: analysis.harvest.product_id,
    }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Store identifiers are short alphanumeric codes; anything else never
/// reaches a review URL.
fn validate_product_id(id: &str) -> Result<(), AppError> {
    if id.is_empty() || id.len() > 32 || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::InvalidProductId(id.to_string()));
    }
    Ok(())
}
