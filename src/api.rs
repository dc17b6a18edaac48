//! HTTP API for SearchGate
//!
//! ## Endpoint Map
//!
//! | Method | Path            | Description                              |
//! |--------|-----------------|------------------------------------------|
//! | GET    | `/health`       | Liveness probe                           |
//! | POST   | `/api/search`   | Run a query through the gate             |
//! | POST   | `/api/new-chat` | Acknowledge a new conversation (no-op)   |
//!
//! `/api/search` always answers `200 OK`; domain failures are reported in
//! the `answer` field. Only malformed or oversized bodies are rejected.

use crate::config::ServerConfig;
use crate::gate::{QueryGate, SearchRequest, SearchResponse};
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Method},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Instrument;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<QueryGate>,
}

/// Build the complete HTTP application
pub fn build_app(gate: Arc<QueryGate>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/search", post(search))
        .route("/api/new-chat", post(new_chat))
        .with_state(AppState { gate })
        .layer(build_cors(&server.cors_origins))
        .layer(RequestBodyLimitLayer::new(server.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    upstream_configured: bool,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream_configured: state.gate.has_provider(),
    })
}

/// POST /api/search
async fn search(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(request): Json<SearchRequest>,
) -> Json<SearchResponse> {
    let origin = origin_from_request(&headers, peer.map(|ConnectInfo(addr)| addr));
    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("search", %request_id, origin = %origin);

    let response = state.gate.handle(&origin, &request).instrument(span).await;
    Json(response)
}

#[derive(Serialize)]
struct NewChatResponse {
    ok: bool,
}

/// POST /api/new-chat
///
/// Conversation memory lives with the client, so there is nothing to clear.
async fn new_chat() -> impl IntoResponse {
    Json(NewChatResponse { ok: true })
}

// =============================================================================
// Helpers
// =============================================================================

/// Quota key for a request: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the peer address, else `"unknown"`.
pub fn origin_from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for header_name in ["x-forwarded-for", "x-real-ip"] {
        if let Some(value) = headers.get(header_name).and_then(|v| v.to_str().ok()) {
            let first = value.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::gate::{SearchMode, AI_LIMIT_ANSWER, INVALID_QUERY_ANSWER};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    fn make_gate() -> Arc<QueryGate> {
        Arc::new(QueryGate::new(&RelayConfig::default(), None))
    }

    fn make_app(gate: Arc<QueryGate>) -> Router {
        build_app(gate, &ServerConfig::default())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn search_request(body: serde_json::Value, forwarded_for: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/search")
            .header("content-type", "application/json")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let resp = make_app(make_gate())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["upstream_configured"], false);
    }

    #[tokio::test]
    async fn test_new_chat() {
        let resp = make_app(make_gate())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/new-chat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_search_mock_answer() {
        let gate = make_gate();
        let resp = make_app(gate.clone())
            .oneshot(search_request(
                json!({"query": "what is magma", "mode": "ai"}),
                "203.0.113.7",
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json["answer"].as_str().unwrap().contains("what is magma"));
        assert_eq!(json["confidence"], 0.3);
        assert_eq!(json["results"], json!([]));
        assert_eq!(gate.quota().usage("203.0.113.7").ai, 1);
    }

    #[tokio::test]
    async fn test_search_invalid_query_is_200() {
        let resp = make_app(make_gate())
            .oneshot(search_request(json!({"query": null, "mode": "ai"}), "1.1.1.1"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json, json!({"answer": INVALID_QUERY_ANSWER, "confidence": 0.0}));
    }

    #[tokio::test]
    async fn test_search_limit_is_200() {
        let gate = make_gate();
        for _ in 0..20 {
            gate.quota().check_and_consume("9.9.9.9", SearchMode::Ai);
        }

        let resp = make_app(gate)
            .oneshot(search_request(json!({"query": "q", "mode": "ai"}), "9.9.9.9, 10.0.0.1"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["answer"], AI_LIMIT_ANSWER);
    }

    #[tokio::test]
    async fn test_search_malformed_json_rejected() {
        let resp = make_app(make_gate())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/search")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn test_search_oversized_body_rejected() {
        let server = ServerConfig {
            max_body_size: 64,
            ..Default::default()
        };
        let app = build_app(make_gate(), &server);
        let big = json!({"query": "x".repeat(500), "mode": "ai"});

        let resp = app.oneshot(search_request(big, "1.2.3.4")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_origin_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", " 198.51.100.1 , 10.0.0.1".parse().unwrap());
        headers.insert("x-real-ip", "192.0.2.9".parse().unwrap());
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(origin_from_request(&headers, Some(peer)), "198.51.100.1");
    }

    #[test]
    fn test_origin_falls_back() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", "192.0.2.9".parse().unwrap());
        assert_eq!(origin_from_request(&headers, None), "192.0.2.9");

        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        assert_eq!(origin_from_request(&HeaderMap::new(), Some(peer)), "127.0.0.1");
        assert_eq!(origin_from_request(&HeaderMap::new(), None), "unknown");
    }

    #[tokio::test]
    async fn test_slow_upstream_answers_200() {
        use crate::gate::AI_NETWORK_ERROR_ANSWER;
        use crate::upstream::{SearchProvider, TavilyClient};
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"answer": "late."}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&upstream)
            .await;

        let mut config = RelayConfig::default();
        config.upstream.base_url = upstream.uri();
        config.upstream.timeout_secs = 1;
        config.server.request_timeout_secs = 2;
        config.validate().unwrap();

        let provider: Arc<dyn SearchProvider> =
            Arc::new(TavilyClient::new(&config.upstream, "test-key").unwrap());
        let gate = Arc::new(QueryGate::new(&config, Some(provider)));
        let resp = build_app(gate, &config.server)
            .oneshot(search_request(json!({"query": "q", "mode": "ai"}), "5.5.5.5"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["answer"], AI_NETWORK_ERROR_ANSWER);
    }

    fn preflight(origin: &str) -> Request<Body> {
        Request::builder()
            .method("OPTIONS")
            .uri("/api/search")
            .header("origin", origin)
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_cors_preflight_any_origin() {
        let resp = make_app(make_gate())
            .oneshot(preflight("http://example.com"))
            .await
            .unwrap();

        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_cors_preflight_configured_origins() {
        let server = ServerConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..Default::default()
        };

        let resp = build_app(make_gate(), &server)
            .oneshot(preflight("http://localhost:5173"))
            .await
            .unwrap();
        assert_eq!(
            resp.headers()["access-control-allow-origin"],
            "http://localhost:5173"
        );

        let resp = build_app(make_gate(), &server)
            .oneshot(preflight("http://evil.example"))
            .await
            .unwrap();
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }
}
