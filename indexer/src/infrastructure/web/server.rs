// Web server shared by both processes

use axum::http::{header, Method};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Adds request tracing and permissive GET CORS
pub fn with_http_layers(router: Router) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::IF_NONE_MATCH])
        .allow_origin(Any);

    router.layer(TraceLayer::new_for_http()).layer(cors)
}

/// Serve `router` on `addr` until `shutdown` is cancelled
pub async fn serve(addr: &str, router: Router, shutdown: CancellationToken) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Starting web server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Web server stopped");
    Ok(())
}
