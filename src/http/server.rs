//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all relay handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Project inbound headers and forward the request upstream, following
//!   upstream redirects
//! - Relay the upstream response back to the caller

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{status::InvalidStatusCode, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use url::Url;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, RelayConfig};
use crate::http::redirect::{send_following_redirects, RedirectPolicy};
use crate::http::request::{build_upstream_request, upstream_uri};
use crate::lifecycle::signals::wait_for_shutdown_signal;
use crate::policy::HeaderBlocklist;
use crate::relay::{
    project, relay, ErrorHandler, OutboundHeaderSet, RelayError, ResponseTarget, UpstreamResponse,
};

/// Errors raised while building or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid upstream URL: {0}")]
    UpstreamUrl(#[from] url::ParseError),

    #[error("invalid status code: {0}")]
    Status(#[from] InvalidStatusCode),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolved failure responses.
#[derive(Debug, Clone)]
struct FailurePolicy {
    streaming_message: String,
    streaming_status: StatusCode,
    upstream_message: String,
    upstream_status: StatusCode,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    client: Client<HttpConnector, Body>,
    upstream: Arc<Url>,
    blocklist: Arc<HeaderBlocklist>,
    redirects: RedirectPolicy,
    failures: Arc<FailurePolicy>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let upstream = Url::parse(&config.upstream.base_url)?;
        let failures = FailurePolicy {
            streaming_message: config.errors.streaming_message.clone(),
            streaming_status: StatusCode::from_u16(config.errors.streaming_status)?,
            upstream_message: config.errors.upstream_message.clone(),
            upstream_status: StatusCode::from_u16(config.errors.upstream_status)?,
        };

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(
            config.upstream.connect_timeout_secs,
        )));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let blocklist = config.headers.effective_blocklist();
        tracing::debug!(blocked = blocklist.len(), "Header blocklist ready");

        let state = AppState {
            client,
            upstream: Arc::new(upstream),
            blocklist: Arc::new(blocklist),
            redirects: config.upstream.redirect_policy(),
            failures: Arc::new(failures),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(relay_handler))
            .route("/{*path}", any(relay_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run until Ctrl+C or SIGTERM.
    pub async fn run(self, listener: TcpListener) -> Result<(), ServerError> {
        self.run_with_shutdown(listener, wait_for_shutdown_signal()).await
    }

    /// Run until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// The router, for embedding into another server.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Forward one request and relay the upstream response.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let (parts, body) = request.into_parts();

    let uri = match upstream_uri(&state.upstream, &parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Cannot build upstream URI");
            return (StatusCode::BAD_REQUEST, "Invalid request target").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        upstream = %uri,
        "Forwarding request"
    );

    let mut outbound = OutboundHeaderSet::new();
    project(&parts, &mut outbound, &state.blocklist);
    let upstream_request = build_upstream_request(&parts, uri, outbound, body);

    let target = ResponseTarget::new();
    match send_following_redirects(&state.client, upstream_request, state.redirects).await {
        Ok(response) => {
            let upstream = UpstreamResponse::from_hyper(response);
            tracing::debug!(
                request_id = %request_id,
                status = upstream.status().as_u16(),
                "Upstream responded"
            );

            let on_error = ErrorHandler::new(target.clone())
                .with_message(state.failures.streaming_message.clone())
                .with_status(state.failures.streaming_status)
                .into_funnel();
            relay(upstream, &target, &state.blocklist, on_error);
        }
        Err(e) => {
            ErrorHandler::new(target.clone())
                .with_message(state.failures.upstream_message.clone())
                .with_status(state.failures.upstream_status)
                .handle(&RelayError::Upstream(Box::new(e)));
        }
    }

    target.into_response()
}
