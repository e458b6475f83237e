// tests/api_http.rs
//
// HTTP-level tests for the router without opening sockets, via
// tower::ServiceExt::oneshot.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _;

use trendscout::api::{self, AppState};
use trendscout::source_weights::SourceWeights;
use trendscout::trends::{Trend, TrendAggregator, TrendContext, TrendProvider};

const BODY_LIMIT: usize = 1024 * 1024;

/// Echoes the requested topic back as a trend, or a niche trend otherwise.
struct EchoProvider;

#[async_trait]
impl TrendProvider for EchoProvider {
    async fn fetch_trends(&self, ctx: &TrendContext) -> Result<Vec<Trend>> {
        let topic = ctx
            .topic()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{} news", ctx.niche));
        Ok(vec![
            Trend::new(topic, "echo", 50.0, "echo"),
            Trend::new("Evergreen", "always there", 10.0, "echo"),
        ])
    }
    fn name(&self) -> &'static str {
        "echo"
    }
}

fn test_router() -> Router {
    let agg = TrendAggregator::builder()
        .provider(Arc::new(EchoProvider))
        .weights(SourceWeights::from_pairs([("echo", 1.5)]))
        .limit(3)
        .build();
    api::router(AppState::new(Arc::new(agg)))
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

#[tokio::test]
async fn health_returns_ok() {
    let resp = test_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "ok");
}

#[tokio::test]
async fn discover_returns_ranked_trends() {
    let payload = json!({ "niche": "gardening", "audience": "retirees", "geo": "CA" });
    let req = Request::builder()
        .method("POST")
        .uri("/trends/discover")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let resp = test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v: Json = serde_json::from_str(&body_string(resp).await).expect("json");
    let arr = v.as_array().expect("array");
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["topic"], "gardening news");
    assert_eq!(arr[0]["source"], "echo");
    assert!(arr[0].get("timestamp").is_some());
    assert!(arr[0].get("url").is_none(), "absent url is omitted");
}

#[tokio::test]
async fn discover_accepts_topic_only_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/trends/discover")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"topic":"Fusion power"}"#))
        .unwrap();

    let resp = test_router().oneshot(req).await.unwrap();
    let v: Json = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(v[0]["topic"], "Fusion power");
}

#[tokio::test]
async fn discover_rejects_non_json() {
    let req = Request::builder()
        .method("POST")
        .uri("/trends/discover")
        .header("content-type", "application/json")
        .body(Body::from("not json"))
        .unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn debug_routes_report_configuration() {
    let resp = test_router()
        .oneshot(Request::get("/debug/providers").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let v: Json = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(v["providers"], json!(["echo"]));
    assert_eq!(v["limit"], 3);
    assert_eq!(v["matcher"], "exact");

    let resp = test_router()
        .oneshot(
            Request::get("/debug/source-weight?source=Echo")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_string(resp).await, "source='Echo' -> weight=1.50");
}
