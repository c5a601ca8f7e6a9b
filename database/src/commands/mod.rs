pub mod create;
pub mod migrate;

use sea_orm::{Database, DatabaseConnection, DbErr};
use thiserror::Error;
use tracing::{error, info};

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("invalid database name '{0}'")]
    InvalidName(String),
}

pub(crate) async fn connect(url: &str) -> Result<DatabaseConnection, CommandError> {
    match Database::connect(url).await {
        Ok(conn) => {
            info!("Connected to database");
            Ok(conn)
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to database");
            Err(e.into())
        }
    }
}
