use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::trends::types::{Trend, TrendContext};
use crate::trends::TrendAggregator;

#[derive(Clone)]
pub struct AppState {
    aggregator: Arc<TrendAggregator>,
}

impl AppState {
    pub fn new(aggregator: Arc<TrendAggregator>) -> Self {
        Self { aggregator }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/trends/discover", post(discover))
        .route("/debug/providers", get(debug_providers))
        .route("/debug/source-weight", get(debug_source_weight))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn discover(
    State(state): State<AppState>,
    Json(ctx): Json<TrendContext>,
) -> Json<Vec<Trend>> {
    Json(state.aggregator.discover_trends(&ctx).await)
}

#[derive(serde::Serialize)]
struct ProvidersOut {
    providers: Vec<&'static str>,
    limit: usize,
    matcher: &'static str,
    timeout_ms: u64,
}

async fn debug_providers(State(state): State<AppState>) -> Json<ProvidersOut> {
    let agg = &state.aggregator;
    Json(ProvidersOut {
        providers: agg.provider_names(),
        limit: agg.limit(),
        matcher: agg.matcher_name(),
        timeout_ms: agg.provider_timeout().as_millis() as u64,
    })
}

async fn debug_source_weight(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> String {
    let s = q.get("source").cloned().unwrap_or_default();
    let w = state.aggregator.weights().weight_for(&s);
    format!("source='{}' -> weight={:.2}", s, w)
}
