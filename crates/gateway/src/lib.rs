//! HTTP API gateway for TaskClaw.
//!
//! Exposes the task agent over `/api`: an SSE endpoint that streams a run's
//! execution log, a buffered run endpoint, per-session history and a health
//! check.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use axum::extract::{ConnectInfo, DefaultBodyLimit};
use axum::{
    Json, Router,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use taskclaw_agent::TaskAgent;
use taskclaw_config::{AppConfig, GatewayConfig};

pub use api::SharedAgent;

/// Build the full router.
///
/// Layers applied:
/// - CORS restricted to the configured origins
/// - Request body size limit
/// - In-memory rate limiting on `/api/*` (health exempt)
/// - HTTP trace logging
pub fn build_router(agent: SharedAgent, config: &GatewayConfig) -> Router {
    let rate_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    Router::new()
        .nest("/api", api::api_router())
        .fallback(api::not_found)
        .with_state(agent)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            rate_limit_middleware(limiter, req, next)
        }))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !config.has_api_key() && config.default_provider != "ollama" {
        return Err("No API key configured. Set TASKCLAW_API_KEY or ANTHROPIC_API_KEY, \
                    or run `taskclaw onboard`"
            .into());
    }

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let providers = taskclaw_providers::build_from_config(&config);
    let provider = providers
        .default()
        .ok_or("No default provider configured")?;
    let agent = Arc::new(TaskAgent::from_config(&config, provider));
    info!(
        provider = %config.default_provider,
        model = %config.default_model,
        tools = agent.tools().len(),
        "Task agent initialized"
    );

    let app = build_router(agent, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::CACHE_CONTROL])
        .max_age(Duration::from_secs(3600));

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(allowed))
}

// --- Rate Limiter ---

/// Simple in-memory sliding-window rate limiter.
///
/// Tracks request timestamps per client key (peer IP).
/// Thread-safe via `std::sync::Mutex` (non-async, held briefly).
struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: std::sync::Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Check if the client is within rate limits. Returns `true` if allowed.
    fn check(&self, client_key: &str) -> bool {
        self.check_at(client_key, Instant::now())
    }

    fn check_at(&self, client_key: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // Periodic cleanup: if map grows too large, evict stale entries
        if clients.len() > 10_000 {
            clients.retain(|_, timestamps| {
                timestamps
                    .last()
                    .is_some_and(|t| now.duration_since(*t) < self.window)
            });
        }

        let timestamps = clients.entry(client_key.to_string()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            return false;
        }

        timestamps.push(now);
        true
    }
}

/// Rate limiting middleware for `/api/*`, keyed by peer IP.
///
/// Requests without connection info (in-process tests) share the
/// "anonymous" bucket. `/api/health` is exempt so monitoring can poll it.
async fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    req: axum::extract::Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if !path.starts_with("/api/") || path == "/api/health" {
        return next.run(req).await;
    }

    let client_key = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    if !limiter.check(&client_key) {
        warn!(client = %client_key, "Rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(api::ErrorResponse {
                error: "Too many requests from this IP, please try again later.".into(),
            }),
        )
            .into_response();
    }

    next.run(req).await
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::test_support::{ScriptedProvider, test_agent};

    fn test_router(config: &GatewayConfig) -> Router {
        build_router(test_agent(ScriptedProvider::new(&["FINAL: ok"])), config)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn limiter_allows_up_to_max_within_window() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let start = Instant::now();
        assert!(limiter.check_at("a", start));
        assert!(limiter.check_at("a", start));
        assert!(!limiter.check_at("a", start));
        // Separate buckets per client
        assert!(limiter.check_at("b", start));
        // The window slides
        assert!(limiter.check_at("a", start + Duration::from_secs(61)));
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = test_router(&GatewayConfig::default())
            .oneshot(get("/api/health"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let app = test_router(&GatewayConfig::default());
        for uri in ["/nope", "/api/nope"] {
            let response = app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);

            let body = response.into_body().collect().await.unwrap().to_bytes();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"], "Route not found");
        }
    }

    #[tokio::test]
    async fn api_is_rate_limited_but_health_is_exempt() {
        let config = GatewayConfig {
            rate_limit_max: 2,
            ..GatewayConfig::default()
        };
        let app = test_router(&config);

        for _ in 0..2 {
            let response = app.clone().oneshot(get("/api/tools")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(get("/api/tools")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        for _ in 0..5 {
            let response = app.clone().oneshot(get("/api/health")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() {
        let app = test_router(&GatewayConfig::default());

        let preflight = |origin: &str| {
            Request::builder()
                .method("OPTIONS")
                .uri("/api/agent/execute")
                .header("origin", origin)
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap()
        };

        let response = app.clone().oneshot(preflight("http://localhost:3000")).await.unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );

        let response = app.oneshot(preflight("http://evil.example")).await.unwrap();
        assert!(response.headers().get("access-control-allow-origin").is_none());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let config = GatewayConfig {
            body_limit_bytes: 64,
            ..GatewayConfig::default()
        };
        let body = format!(r#"{{"task": "{}"}}"#, "x".repeat(256));
        let request = Request::builder()
            .method("POST")
            .uri("/api/agent/run")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = test_router(&config).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
