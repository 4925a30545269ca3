//! UserRepository - Directory of addresses known to the chat

use sqlx::{Error, SqlitePool};
use tracing::{debug, instrument};

// USER REPO
pub struct UserRepository {
    connection_pool: SqlitePool,
}

impl UserRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Idempotent: registering a known address is a no-op
    #[instrument(skip(self))]
    pub async fn register(&self, email: &str) -> Result<(), Error> {
        let result = sqlx::query("INSERT OR IGNORE INTO users (email) VALUES (?)")
            .bind(email)
            .execute(&self.connection_pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!("New address registered");
        }
        Ok(())
    }

    pub async fn list_emails(&self) -> Result<Vec<String>, Error> {
        let emails = sqlx::query_scalar::<_, String>("SELECT email FROM users ORDER BY email")
            .fetch_all(&self.connection_pool)
            .await?;

        Ok(emails)
    }
}
