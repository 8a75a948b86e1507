// ABOUTME: HTTP server assembly: merges every route group and applies the middleware stack
// ABOUTME: Serves until ctrl-c or SIGTERM, then drains in-flight requests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 ReviewMyCoach Contributors

use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, Router};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::{info, warn, Level};

use crate::errors::{AppError, AppResult};
use crate::resources::ServerResources;
use crate::routes::{
    AccountRoutes, AnalyticsRoutes, BillingRoutes, CoachesRoutes, HealthRoutes, JobsRoutes,
    MessagesRoutes, ReportsRoutes, ServicesRoutes, TagsRoutes,
};

/// Largest accepted request body
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Requests running past `timeout` answer 408
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Build the complete application router with middleware applied
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    let timeout = resources.config.request_timeout;

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(CoachesRoutes::routes(resources.clone()))
        .merge(AccountRoutes::routes(resources.clone()))
        .merge(MessagesRoutes::routes(resources.clone()))
        .merge(JobsRoutes::routes(resources.clone()))
        .merge(TagsRoutes::routes(resources.clone()))
        .merge(ServicesRoutes::routes(resources.clone()))
        .merge(BillingRoutes::routes(resources.clone()))
        .merge(AnalyticsRoutes::routes(resources.clone()))
        .merge(ReportsRoutes::routes(resources.clone()))
        // Layers run bottom-up: the request id is set before tracing sees the request
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .layer(timeout_layer(timeout))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Bind the configured address and serve until a shutdown signal arrives
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
pub async fn serve(resources: Arc<ServerResources>) -> AppResult<()> {
    let host = resources.config.host.clone();
    let port = resources.config.http_port;
    let app = build_router(&resources);

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {host}:{port}: {e}")))?;
    let local = listener
        .local_addr()
        .map_err(|e| AppError::internal(format!("Transport error: {e}")))?;
    info!("HTTP server listening on http://{local}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Transport error: {e}")))?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn slow_request_answers_request_timeout() {
        let app = Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(20)));

        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
