//! HTTP API server for lanwake

pub mod devices;
pub mod health;
pub mod rate_limit;
pub mod request_id;

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use axum::{Json, Router, http::StatusCode};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::db::DbPool;
use crate::registry::DeviceRegistry;
use crate::wake::WakeDispatcher;
use crate::Result;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub db: DbPool,
    pub registry: DeviceRegistry,
    pub dispatcher: WakeDispatcher,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

impl ApiState {
    /// Create API state over a database pool and dispatcher
    #[must_use]
    pub fn new(db: DbPool, dispatcher: WakeDispatcher) -> Self {
        Self {
            registry: DeviceRegistry::new(db.clone()),
            db,
            dispatcher,
            rate_limiter: None,
        }
    }
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    db: DbPool,
    dispatcher: WakeDispatcher,
    host: String,
    port: u16,
    rate_limit_per_minute: u32,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(db: DbPool, dispatcher: WakeDispatcher, port: u16) -> Self {
        Self {
            db,
            dispatcher,
            host: "0.0.0.0".to_string(),
            port,
            rate_limit_per_minute: 0,
        }
    }

    /// Set the host to bind
    #[must_use]
    pub fn host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    /// Set the global rate limit; `0` disables it
    #[must_use]
    pub const fn rate_limit_per_minute(mut self, rpm: u32) -> Self {
        self.rate_limit_per_minute = rpm;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let mut state = ApiState::new(self.db, self.dispatcher);
        if self.rate_limit_per_minute > 0 {
            state.rate_limiter = Some(rate_limit::per_minute(self.rate_limit_per_minute));
        }

        ApiServer {
            state: Arc::new(state),
            host: self.host,
            port: self.port,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    host: String,
    port: u16,
}

impl ApiServer {
    /// Build the router with all routes and middleware
    #[must_use]
    pub fn router(&self) -> Router {
        router(self.state.clone())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(%addr, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// Build the full application router over shared state
pub fn router(state: Arc<ApiState>) -> Router {
    let router = Router::new()
        .nest("/api/devices", devices::router(state.clone()))
        .nest("/api/wake", devices::wake_router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state.clone()));

    // Applies to every route, health checks included
    let router = router.layer(axum::middleware::from_fn_with_state(
        state,
        rate_limit::throttle,
    ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down API server");
}

/// API error rendered as `{"error": {"code", "message"}}`
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest {
        code: &'static str,
        message: String,
    },
    RateLimited,
    Internal(String),
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        let code = match &err {
            crate::Error::DuplicateName(_) => "duplicate_name",
            crate::Error::InvalidMac(_) => "invalid_mac",
            crate::Error::InvalidDevice(_) => "invalid_device",
            _ => {
                tracing::error!(error = %err, "request failed");
                return Self::Internal(err.to_string());
            }
        };

        Self::BadRequest {
            code,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: ErrorBody,
        }

        #[derive(Serialize)]
        struct ErrorBody {
            code: &'static str,
            message: String,
        }

        let (status, code, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "too many requests, retry later".to_string(),
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        (status, Json(ErrorResponse { error: ErrorBody { code, message } })).into_response()
    }
}
