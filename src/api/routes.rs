use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::ai::AiProvider;
use crate::api::health::HealthState;
use crate::api::latency::{LatencyStats, ProviderLatency};
use crate::config::Theme;
use crate::error::AppError;
use crate::insights::{recommend, Recommendation};
use crate::scheduler::RefreshScheduler;
use crate::service::ProductService;
use crate::types::{ListingRecord, PlatformListing, PriceHistoryPoint, Product};

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<ProductService>,
    pub scheduler: Arc<RefreshScheduler>,
    pub ai: Arc<AiProvider>,
    pub health: Arc<HealthState>,
    pub latency: Arc<LatencyStats>,
    pub theme: Theme,
    pub refresh_minutes: u64,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/products", get(get_products).post(post_product))
        .route("/products/:id/listings", get(get_listings))
        .route("/products/:id/refresh", post(post_product_refresh))
        .route("/products/:id/recommendation", get(get_recommendation))
        .route("/listings/:id/history", get(get_history))
        .route("/refresh", post(post_refresh))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ProductsQuery {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct AddProductRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub days: Option<u32>,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub scheduler_running: bool,
    pub refresh_interval_minutes: u64,
    pub last_pass_at_ns: Option<i64>,
    pub last_pass_refreshed: u64,
    pub last_pass_failed: u64,
    pub passes_completed: u64,
    pub ai_configured: bool,
    pub theme: Theme,
}

#[derive(Serialize)]
pub struct ProductWithListings {
    pub product: Product,
    pub listings: Vec<ListingRecord>,
}

#[derive(Serialize)]
pub struct RefreshAccepted {
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    let (refreshed, failed) = state.health.last_pass_counts();
    Json(HealthResponse {
        status: "ok",
        scheduler_running: state.scheduler.is_running(),
        refresh_interval_minutes: state.refresh_minutes,
        last_pass_at_ns: state.health.last_pass_at_ns(),
        last_pass_refreshed: refreshed,
        last_pass_failed: failed,
        passes_completed: state.health.passes_completed(),
        ai_configured: state.ai.is_configured(),
        theme: state.theme,
    })
}

async fn get_products(
    State(state): State<ApiState>,
    Query(params): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>, AppError> {
    let products = match params.q.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => state.service.search(term).await?,
        _ => state.service.all_products().await?,
    };
    Ok(Json(products))
}

async fn post_product(
    State(state): State<ApiState>,
    Json(body): Json<AddProductRequest>,
) -> Result<Json<ProductWithListings>, AppError> {
    let (product, listings) = state.service.add_by_name(&body.name).await?;
    Ok(Json(ProductWithListings { product, listings }))
}

async fn get_listings(
    State(state): State<ApiState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Vec<ListingRecord>>, AppError> {
    Ok(Json(state.service.listings(product_id).await?))
}

async fn post_product_refresh(
    State(state): State<ApiState>,
    Path(product_id): Path<i64>,
) -> Result<Json<ProductWithListings>, AppError> {
    state.service.refresh(product_id).await?;
    let product = state.service.product(product_id).await?;
    let listings = state.service.listings(product_id).await?;
    Ok(Json(ProductWithListings { product, listings }))
}

async fn get_recommendation(
    State(state): State<ApiState>,
    Path(product_id): Path<i64>,
) -> Result<Json<Recommendation>, AppError> {
    let listings: Vec<PlatformListing> = state
        .service
        .listings(product_id)
        .await?
        .into_iter()
        .map(|r| r.listing)
        .collect();

    recommend(&state.ai, &listings)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NoData(format!("listings for product {product_id}")))
}

async fn get_history(
    State(state): State<ApiState>,
    Path(listing_id): Path<i64>,
    Query(params): Query<HistoryQuery>,
) -> Result<Json<Vec<PriceHistoryPoint>>, AppError> {
    let days = params.days.unwrap_or(30);
    Ok(Json(state.service.history(listing_id, days).await?))
}

async fn post_refresh(
    State(state): State<ApiState>,
) -> Result<(StatusCode, Json<RefreshAccepted>), AppError> {
    state.scheduler.trigger_manual()?;
    Ok((StatusCode::ACCEPTED, Json(RefreshAccepted { status: "accepted" })))
}

async fn get_stats_latency(
    State(state): State<ApiState>,
) -> Json<BTreeMap<&'static str, ProviderLatency>> {
    Json(state.latency.snapshot())
}
