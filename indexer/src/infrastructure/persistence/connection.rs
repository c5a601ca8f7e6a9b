use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::infrastructure::persistence::error::StoreError;

/// Manages database connection pool
pub struct DbPool {
    connection: DatabaseConnection,
}

impl DbPool {
    /// Creates a new database connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let mut options = ConnectOptions::new(config.url());
        options
            .max_connections(config.psql.max_connections)
            .min_connections(config.psql.min_connections)
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        info!(
            host = %config.psql.host,
            port = config.psql.port,
            dbname = %config.psql.dbname,
            "Connecting to database"
        );

        match Database::connect(options).await {
            Ok(connection) => {
                info!("Database connection established");
                Ok(DbPool { connection })
            }
            Err(e) => {
                error!(error = %e, "Failed to connect to database");
                Err(StoreError::Connection(e.to_string()))
            }
        }
    }

    pub fn into_connection(self) -> DatabaseConnection {
        self.connection
    }
}
