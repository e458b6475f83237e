// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod metrics;
pub mod providers;
pub mod source_weights;
pub mod trends;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::trends::{Trend, TrendAggregator, TrendContext, TrendProvider};

use tracing::info;

/// One-off discovery against the configured providers. It won't panic on
/// provider failure; it just logs the result.
///
/// ```ignore
/// if let Err(e) = trendscout::run_trends_quick_probe().await {
///     tracing::warn!(error=?e, "trends quick probe didn't run");
/// }
/// ```
pub async fn run_trends_quick_probe() -> anyhow::Result<()> {
    let rt = bootstrap::TrendsRuntime::from_default_location()?;
    rt.quick_probe().await;
    info!("trends quick probe finished");
    Ok(())
}
