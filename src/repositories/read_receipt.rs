//! ReadReceiptRepository - Read receipts and the unread aggregates

use crate::entities::MessageKind;
use chrono::Utc;
use sqlx::{Error, SqlitePool};
use tracing::{debug, instrument};

// READ RECEIPT REPO
pub struct ReadReceiptRepository {
    connection_pool: SqlitePool,
}

impl ReadReceiptRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Insert-or-ignore one receipt per message id for `user_email`, in a
    /// single transaction. Returns how many receipts were new.
    #[instrument(skip(self, message_ids), fields(count = message_ids.len()))]
    pub async fn mark_many(&self, message_ids: &[i64], user_email: &str) -> Result<u64, Error> {
        if message_ids.is_empty() {
            return Ok(0);
        }

        let read_at = Utc::now();
        let mut tx = self.connection_pool.begin().await?;
        let mut inserted = 0;

        for message_id in message_ids {
            let result = sqlx::query(
                "INSERT OR IGNORE INTO message_reads (message_id, user_email, read_at) VALUES (?, ?, ?)",
            )
            .bind(message_id)
            .bind(user_email)
            .bind(read_at)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        debug!(inserted, "Receipts upserted");
        Ok(inserted)
    }

    /// Organization-wide messages without a receipt for `user_email`.
    /// Messages authored by the user never count.
    pub async fn count_unread_group_messages(&self, user_email: &str) -> Result<u64, Error> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM messages m
            WHERE m.kind = ?
              AND m.sender <> ?
              AND NOT EXISTS (
                  SELECT 1 FROM message_reads r
                  WHERE r.message_id = m.id AND r.user_email = ?
              )
            "#,
        )
        .bind(MessageKind::Group)
        .bind(user_email)
        .bind(user_email)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    /// Distinct senders of direct messages to `user_email` that the user has
    /// not read yet.
    pub async fn list_unread_dm_peers(&self, user_email: &str) -> Result<Vec<String>, Error> {
        let peers: Vec<Option<String>> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT m.sender
            FROM messages m
            WHERE m.kind = ?
              AND m.recipient = ?
              AND m.sender <> ?
              AND NOT EXISTS (
                  SELECT 1 FROM message_reads r
                  WHERE r.message_id = m.id AND r.user_email = ?
              )
            ORDER BY m.sender
            "#,
        )
        .bind(MessageKind::Dm)
        .bind(user_email)
        .bind(user_email)
        .bind(user_email)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(peers.into_iter().flatten().collect())
    }
}
