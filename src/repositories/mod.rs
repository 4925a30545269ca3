//! Repositories module - Coordinator for every repository of the project
//!
//! Each repository owns the SQL for one table. Queries are built at runtime
//! (`sqlx::query` / `query_as` / `QueryBuilder`) so the crate compiles
//! without a live database; the schema lives in `migrations/` and is
//! embedded in the binary through [`MIGRATOR`].

pub mod message;
pub mod read_receipt;
pub mod traits;
pub mod user;

// Re-export of the traits
pub use traits::Create;

// Re-export of the repository structs
pub use message::MessageRepository;
pub use read_receipt::ReadReceiptRepository;
pub use user::UserRepository;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

/// Embedded schema migrations
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Opens the pool (creating the database file when missing) and applies
/// pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    MIGRATOR.run(&pool).await?;
    info!("Database ready, migrations applied");
    Ok(pool)
}
