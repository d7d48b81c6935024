// src/api/mod.rs - HTTP surface of the calculator

pub mod handlers;
pub mod types;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::infra::config::AppConfig;
use crate::infra::errors::CalcError;
use crate::repository::{CalcResult, CalcResultRepository};
use crate::service::{CalculationService, LineItem};
use crate::session::{operation, transactional, Operation, SessionFactory, SessionManager};
pub use types::CalcRequest;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Calculate-and-save, one transaction per call.
    pub calculate: Operation<Vec<LineItem>, CalcResult, CalcError>,
}

/// Wire repository, service and transactional wrapper over `factory`.
pub fn app_state(factory: Arc<dyn SessionFactory>) -> ApiState {
    let sessions = SessionManager::new(factory);
    let repository = Arc::new(CalcResultRepository::new(sessions.clone()));
    let service = CalculationService::new(repository);

    let calculate = transactional(
        sessions,
        operation(move |items: Vec<LineItem>| {
            let service = service.clone();
            async move { service.calculate_and_save(&items).await }
        }),
    );
    ApiState { calculate }
}

/// Build the axum router with all API routes.
pub fn build_router(state: ApiState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "http_request",
            trace_id = %uuid::Uuid::new_v4(),
            method = %request.method(),
            uri = %request.uri()
        )
    });

    Router::new()
        .route("/calc", post(handlers::calc))
        .route("/health", get(handlers::health))
        .layer(trace)
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn start_server<S>(
    config: &AppConfig,
    state: ApiState,
    shutdown: S,
) -> anyhow::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("{} listening on http://{}", config.title, listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
