// Routes shared by the job and API processes

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::infrastructure::telemetry::MetricsRecorder;
use crate::infrastructure::web::health::{health_router, HealthState};

/// Health and metrics routes
pub fn create_router(health: HealthState, recorder: Arc<dyn MetricsRecorder>) -> Router {
    Router::new()
        .merge(health_router(health))
        .merge(metrics_router(recorder))
}

pub fn metrics_router(recorder: Arc<dyn MetricsRecorder>) -> Router {
    Router::new()
        .route("/metrics", get(metrics))
        .with_state(recorder)
}

async fn metrics(State(recorder): State<Arc<dyn MetricsRecorder>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        recorder.render(),
    )
}
