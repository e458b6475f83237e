//! Trend discovery service: binary entrypoint.
//! Loads config, registers providers and serves the discovery API.

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trendscout::api::{self, AppState};
use trendscout::bootstrap::TrendsRuntime;
use trendscout::metrics::Metrics;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Compact logs by default; `TRENDS_LOG_FORMAT=json` for structured output.
/// `RUST_LOG` overrides the filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trendscout=info,trends=info,warn"));

    let json = std::env::var("TRENDS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    init_tracing();

    let runtime = TrendsRuntime::from_default_location().context("loading trends config")?;
    let metrics = Metrics::init(runtime.aggregator.provider_names().len())?;

    if std::env::var("TRENDS_STARTUP_PROBE").is_ok_and(|v| v == "1") {
        runtime.quick_probe().await;
    }

    let app = api::router(AppState::new(runtime.aggregator.clone())).merge(metrics.router());

    let addr = std::env::var("TRENDS_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "trendscout listening");

    if let Err(e) = axum::serve(listener, app).await {
        warn!(error = ?e, "server stopped");
        return Err(e.into());
    }
    Ok(())
}
