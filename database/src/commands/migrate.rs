use migration::{Migrator, MigratorTrait};
use tracing::{info, warn};

use super::{connect, CommandError};
use crate::config::DatabaseConfig;

/// Applies pending migrations, all of them unless `steps` is given
pub async fn execute(steps: Option<u32>) -> Result<(), CommandError> {
    let config = DatabaseConfig::from_env()?;
    let conn = connect(&config.url).await?;

    let pending = Migrator::get_pending_migrations(&conn).await?;
    if pending.is_empty() {
        info!("Schema is up to date");
        return Ok(());
    }
    for m in &pending {
        info!(migration = %m.name(), "Pending migration");
    }

    match steps {
        Some(n) => info!(steps = n, "Applying migrations"),
        None => info!(count = pending.len(), "Applying all pending migrations"),
    }
    Migrator::up(&conn, steps).await?;
    info!("Migrations applied");
    Ok(())
}

/// Drops every table the migrator knows about and re-applies all migrations
pub async fn reset() -> Result<(), CommandError> {
    let config = DatabaseConfig::from_env()?;
    warn!(database = %config.name, "Resetting database, all indexed data will be lost");
    let conn = connect(&config.url).await?;

    Migrator::fresh(&conn).await?;
    info!("Database reset complete");
    Ok(())
}

/// Logs applied and pending migrations
pub async fn status() -> Result<(), CommandError> {
    let config = DatabaseConfig::from_env()?;
    let conn = connect(&config.url).await?;

    let applied = Migrator::get_applied_migrations(&conn).await?;
    let pending = Migrator::get_pending_migrations(&conn).await?;

    info!(
        database = %config.name,
        applied = applied.len(),
        pending = pending.len(),
        "Migration status"
    );
    for m in &applied {
        info!(migration = %m.name(), "Applied");
    }
    for m in &pending {
        info!(migration = %m.name(), "Pending");
    }
    Ok(())
}
