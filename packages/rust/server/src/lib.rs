//! HTTP query boundary for billtrack.
//!
//! Exposes `GET /api/bills` (full scrape per request) and `GET /health`.

pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use billtrack_core::BillService;
use billtrack_shared::{BilltrackError, Result};

pub use routes::{ApiError, bills_handler, health_handler};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BillService>,
}

impl AppState {
    pub fn new(service: BillService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Build the router with tracing and permissive CORS (the UI is served elsewhere).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/bills", get(bills_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| BilltrackError::Network(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "listening");

    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| BilltrackError::Network(format!("server error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use billtrack_core::Pipeline;
    use billtrack_crawler::HttpFetcher;
    use billtrack_shared::{CrawlConfig, Record, SourceConfig};
    use billtrack_storage::{MemoryStore, SnapshotStore};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct BrokenStore;

    #[async_trait]
    impl SnapshotStore for BrokenStore {
        async fn save(&self, _records: &[Record]) -> Result<()> {
            Err(BilltrackError::Persistence("read-only filesystem".into()))
        }

        async fn load(&self) -> Result<Option<Vec<Record>>> {
            Ok(None)
        }

        fn describe(&self) -> String {
            "broken".into()
        }
    }

    fn app(server: &MockServer, store: Arc<dyn SnapshotStore>) -> Router {
        let source = SourceConfig::new(&server.uri(), "/billtrack/").unwrap();
        let crawl = CrawlConfig {
            concurrency: 2,
            timeout: Duration::from_secs(5),
            no_cache: true,
        };
        let fetcher = Arc::new(HttpFetcher::new(&crawl).unwrap());
        let pipeline = Pipeline::new(fetcher, source, crawl).unwrap();
        build_router(AppState::new(BillService::new(pipeline, store)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn mount_catalog(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/billtrack/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<div class="view-content">
                    <div class="views-row">
                        <a href="/bill/one">Bill One</a>
                        <span class="views-field-field-bill-status">Passed</span>
                    </div>
                    <div class="views-row"><a href="/bill/two">Bill Two</a></div>
                </div>"#,
            ))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bill/one"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"<a href="/docs/one.pdf">Text</a>"#),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bill/two"))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn bills_endpoint_returns_records() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;

        let (status, json) =
            get_json(app(&server, Arc::new(MemoryStore::new())), "/api/bills").await;

        assert_eq!(status, StatusCode::OK);
        let bills = json.as_array().expect("array body");
        assert_eq!(bills.len(), 2);

        assert_eq!(bills[0]["id"], 1);
        assert_eq!(bills[0]["title"], "Bill One");
        assert_eq!(bills[0]["status"], "Passed");
        assert_eq!(bills[0]["pdf"], format!("{}/docs/one.pdf", server.uri()));
        assert_eq!(bills[0]["resolutionState"], "Resolved");

        assert_eq!(bills[1]["id"], 2);
        assert_eq!(bills[1]["link"], format!("{}/bill/two", server.uri()));
        assert!(bills[1]["pdf"].is_null());
        assert_eq!(bills[1]["status"], "");
        assert_eq!(bills[1]["resolutionState"], "Failed");
    }

    #[tokio::test]
    async fn store_failure_still_returns_success() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;

        let (status, json) = get_json(app(&server, Arc::new(BrokenStore)), "/api/bills").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn listing_failure_is_explicit_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/billtrack/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (status, json) =
            get_json(app(&server, Arc::new(MemoryStore::new())), "/api/bills").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Failed to fetch bills");
    }

    #[tokio::test]
    async fn empty_listing_is_empty_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/billtrack/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let (status, json) =
            get_json(app(&server, Arc::new(MemoryStore::new())), "/api/bills").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!([]));
    }

    #[tokio::test]
    async fn health_endpoint() {
        let server = MockServer::start().await;
        let (status, json) = get_json(app(&server, Arc::new(MemoryStore::new())), "/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
    }
}
