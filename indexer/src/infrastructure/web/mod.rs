pub mod health;
pub mod routes;
pub mod server;

pub use health::HealthState;
pub use routes::{create_router, metrics_router};
pub use server::{serve, with_http_layers};
