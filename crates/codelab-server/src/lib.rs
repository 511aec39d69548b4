//! HTTP API for codelab.
//!
//! Exposes the remote code-execution proxy over HTTP:
//!
//! - `GET  /health`
//! - `GET  /api/code/languages`
//! - `POST /api/code/execute` (bearer auth, per-caller rate limit)
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use codelab_executor::{CodeRunner, PistonBackend};
//! use codelab_server::{Server, ServerConfig};
//!
//! let runner = CodeRunner::new(Arc::new(PistonBackend::from_env()?));
//! let config = ServerConfig::new(Some("secret-token".to_string()))
//!     .with_bind_address("127.0.0.1:5000".parse()?);
//!
//! Server::new(runner, config).run().await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod ratelimit;
pub mod routes;
pub mod state;

pub use auth::{AuthError, Identity, auth_middleware};
pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use ratelimit::{
    RateLimits, execute_rate_limit_middleware, rate_limit_middleware, request_logging_middleware,
};
pub use routes::HealthResponse;
pub use state::AppState;

use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
};
use codelab_executor::CodeRunner;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The codelab HTTP server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server with the given runner and configuration.
    pub fn new(runner: CodeRunner, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(runner, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .merge(routes::health_routes())
            .nest("/api/code", self.code_routes())
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            // Request logging (inner layer, runs first)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::request_logging_middleware,
            ))
            // Rate limiting (outer layer, runs before request logging)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                ratelimit::rate_limit_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        // Outermost, so preflight requests never hit the limiters.
        if let Some(cors) = cors_layer(&self.state.config.cors_origins) {
            router = router.layer(cors);
        }

        router
    }

    /// Code execution routes, nested under `/api/code`.
    fn code_routes(&self) -> Router<AppState> {
        use axum::routing::{get, post};

        Router::new()
            .route("/languages", get(routes::languages_handler))
            .route(
                "/execute",
                post(routes::execute_handler)
                    .route_layer(middleware::from_fn_with_state(
                        self.state.clone(),
                        ratelimit::execute_rate_limit_middleware,
                    ))
                    // Auth runs first so rejected callers do not spend quota.
                    .route_layer(middleware::from_fn_with_state(
                        self.state.clone(),
                        auth::auth_middleware,
                    )),
            )
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        if self.state.config.auth_token.is_none() {
            warn!("No API token configured, /api/code/execute accepts unauthenticated requests");
        }

        info!(
            backend = self.state.runner.backend().name(),
            "Starting server on {}", addr
        );

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

/// CORS for the configured origins; `None` when the list is empty.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
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

    if allowed.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(allowed)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use codelab_executor::MockBackend;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn create_test_server(config: ServerConfig) -> Server {
        Server::new(CodeRunner::new(Arc::new(MockBackend::new())), config)
    }

    #[tokio::test]
    async fn test_server_health_endpoint() {
        let app = create_test_server(ServerConfig::new(Some("test-token".to_string()))).router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let app = create_test_server(ServerConfig::default()).router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/courses")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_preflight_for_allowed_origin() {
        let app = create_test_server(ServerConfig::default()).router();

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/code/execute")
                    .header("Origin", "http://localhost:5173")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_cors_ignores_other_origins() {
        let app = create_test_server(ServerConfig::default()).router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("Origin", "https://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(
            response
                .headers()
                .get("access-control-allow-origin")
                .is_none()
        );
    }

    #[test]
    fn test_cors_disabled_without_origins() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["http://localhost:5173".to_string()]).is_some());
    }
}
