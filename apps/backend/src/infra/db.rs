use std::time::Duration;

use migration::MigratorTrait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::db::{db_url, DbOwner, DbProfile};
use crate::error::AppError;

/// Connect to the database for the given profile and owner.
pub async fn connect_db(
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let url = db_url(profile, owner)?;

    let mut opts = ConnectOptions::new(url);
    opts.max_connections(10)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let conn = Database::connect(opts).await?;
    Ok(conn)
}

/// Connect with owner credentials and bring the schema up to date, then
/// hand back an app-level connection for serving traffic.
pub async fn bootstrap_db(profile: DbProfile) -> Result<DatabaseConnection, AppError> {
    let owner_conn = connect_db(profile.clone(), DbOwner::Owner).await?;

    migration::Migrator::up(&owner_conn, None)
        .await
        .map_err(|e| AppError::db(format!("migration failed: {e}")))?;
    info!("database schema is up to date");

    owner_conn
        .close()
        .await
        .map_err(|e| AppError::db(format!("failed to close owner connection: {e}")))?;

    connect_db(profile, DbOwner::App).await
}
