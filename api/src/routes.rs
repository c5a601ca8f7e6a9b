// Router for the API process

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use tezos_indexer::infrastructure::telemetry::MetricsRecorder;
use tezos_indexer::infrastructure::web::{create_router as health_and_metrics, with_http_layers, HealthState};

use crate::handlers::{get_delegations, AppState};

/// Upper bound on handling one request
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn create_router(
    state: AppState,
    health: HealthState,
    recorder: Arc<dyn MetricsRecorder>,
) -> Router {
    let api = Router::new()
        .route("/xtz/delegations", get(get_delegations))
        .with_state(state);

    with_http_layers(api.merge(health_and_metrics(health, recorder)))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
