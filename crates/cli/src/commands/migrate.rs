//! Database migration commands.
//!
//! Migrations live in `crates/orders/migrations/` and are embedded into the
//! binary at compile time.
//!
//! # Environment Variables
//!
//! - `SHOP_DATABASE_URL` - Primary `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use std::collections::HashSet;

use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::migrate::{Migrate, MigrateError, Migrator};

use online_shop_orders::db::create_pool;

static MIGRATOR: Migrator = sqlx::migrate!("../orders/migrations");

/// Errors from the migration commands.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] MigrateError),
}

/// Apply all pending migrations to the primary database.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails, or
/// a migration fails to apply.
pub async fn run() -> Result<(), MigrationError> {
    let pool = connect().await?;

    tracing::info!("Running orders migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Orders migrations complete!");
    Ok(())
}

/// Log each embedded migration and whether it has been applied.
///
/// # Errors
///
/// Returns an error if the database URL is missing or the migration table
/// cannot be read.
pub async fn status() -> Result<(), MigrationError> {
    let pool = connect().await?;
    let mut conn = pool.acquire().await?;

    conn.ensure_migrations_table().await?;
    let applied: HashSet<i64> = conn
        .list_applied_migrations()
        .await?
        .into_iter()
        .map(|migration| migration.version)
        .collect();

    for migration in MIGRATOR.iter() {
        tracing::info!(
            version = migration.version,
            description = %migration.description,
            applied = applied.contains(&migration.version),
            "Migration"
        );
    }
    Ok(())
}

async fn connect() -> Result<PgPool, MigrationError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrationError::MissingEnvVar("SHOP_DATABASE_URL"))?;

    tracing::info!("Connecting to orders database...");
    Ok(create_pool(&database_url, 1).await?)
}
