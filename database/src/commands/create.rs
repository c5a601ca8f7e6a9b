use sea_orm::{ConnectionTrait, DbBackend, Statement};
use tracing::info;

use super::{connect, CommandError};
use crate::config::{DatabaseConfig, DEFAULT_MAINTENANCE_DB};

/// Creates the target database through the server's maintenance database
pub async fn execute(name: Option<String>) -> Result<(), CommandError> {
    let config = DatabaseConfig::from_env()?;
    let db_name = name.unwrap_or_else(|| config.name.clone());
    if !is_valid_identifier(&db_name) {
        return Err(CommandError::InvalidName(db_name));
    }

    info!(database = %db_name, host = %config.host, "Creating database");
    let conn = connect(&config.url_for(DEFAULT_MAINTENANCE_DB)).await?;

    let existing = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT 1 FROM pg_database WHERE datname = $1",
            [db_name.clone().into()],
        ))
        .await?;
    if existing.is_some() {
        info!(database = %db_name, "Database already exists");
        return Ok(());
    }

    // CREATE DATABASE does not accept bind parameters
    conn.execute_unprepared(&format!("CREATE DATABASE \"{db_name}\""))
        .await?;
    info!(database = %db_name, "Database created");
    Ok(())
}

fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
