// Liveness, readiness and diagnostics

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::infrastructure::persistence::DelegationStore;

struct HealthInner {
    component: &'static str,
    ready: AtomicBool,
    shutting_down: AtomicBool,
    store: Arc<dyn DelegationStore>,
    started_at: Instant,
}

/// Readiness and shutdown flags shared between the server, the poller and
/// the signal handler
#[derive(Clone)]
pub struct HealthState {
    inner: Arc<HealthInner>,
}

impl HealthState {
    pub fn new(component: &'static str, store: Arc<dyn DelegationStore>) -> Self {
        Self {
            inner: Arc::new(HealthInner {
                component,
                ready: AtomicBool::new(false),
                shutting_down: AtomicBool::new(false),
                store,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.inner.ready.store(ready, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.inner.ready.load(Ordering::SeqCst)
    }

    pub fn begin_shutdown(&self) {
        self.inner.shutting_down.store(true, Ordering::SeqCst);
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    /// Ready flag set, store reachable and no shutdown in progress
    pub async fn check_ready(&self) -> Result<(), String> {
        if self.is_shutting_down() {
            return Err("shutting down".to_string());
        }
        if !self.is_ready() {
            return Err("not ready".to_string());
        }
        self.inner
            .store
            .ping()
            .await
            .map_err(|e| format!("store ping failed: {e}"))
    }
}

pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(live))
        .route("/health/ready", get(ready))
        .with_state(state)
}

async fn live(State(state): State<HealthState>) -> impl IntoResponse {
    if state.is_shutting_down() {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "shutting_down" })))
    } else {
        (StatusCode::OK, Json(json!({ "status": "alive" })))
    }
}

async fn ready(State(state): State<HealthState>) -> impl IntoResponse {
    match state.check_ready().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))),
        Err(reason) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "not_ready", "reason": reason })),
        ),
    }
}

async fn health(State(state): State<HealthState>) -> impl IntoResponse {
    let store = match state.inner.store.ping().await {
        Ok(()) => json!({ "status": "ok", "impl": state.inner.store.implementation() }),
        Err(e) => json!({
            "status": "error",
            "impl": state.inner.store.implementation(),
            "error": e.to_string(),
        }),
    };
    let ready = state.check_ready().await.is_ok();
    let (status, label) = if ready {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "component": state.inner.component,
            "version": env!("CARGO_PKG_VERSION"),
            "ready": state.is_ready(),
            "shutting_down": state.is_shutting_down(),
            "uptime_seconds": state.inner.started_at.elapsed().as_secs(),
            "store": store,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::MemoryStore;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    async fn status_of(router: Router, uri: &str) -> StatusCode {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn readiness_follows_flags_and_store() {
        let store = Arc::new(MemoryStore::new());
        let state = HealthState::new("test", store.clone());
        let router = health_router(state.clone());

        assert_eq!(status_of(router.clone(), "/health/live").await, StatusCode::OK);
        assert_eq!(
            status_of(router.clone(), "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );

        state.set_ready(true);
        assert_eq!(status_of(router.clone(), "/health/ready").await, StatusCode::OK);
        assert_eq!(status_of(router.clone(), "/health").await, StatusCode::OK);

        store.set_unavailable(true);
        assert_eq!(
            status_of(router.clone(), "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        store.set_unavailable(false);

        state.begin_shutdown();
        assert_eq!(
            status_of(router.clone(), "/health/live").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(router, "/health/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
