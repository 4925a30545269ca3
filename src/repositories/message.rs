//! MessageRepository - Repository for chat messages

use super::Create;
use crate::dtos::CreateMessageDTO;
use crate::entities::{ChangeOp, Message, MessageKind};
use crate::messaging::QueryFilter;
use crate::ws::ChangeFeed;
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

const MESSAGE_COLUMNS: &str = "id, text, sender, role, kind, recipient, created_at";

// MESSAGE REPO
pub struct MessageRepository {
    connection_pool: SqlitePool,
    feed: ChangeFeed,
}

impl MessageRepository {
    /// Every committed insert is published on `feed`.
    pub fn new(connection_pool: SqlitePool, feed: ChangeFeed) -> Self {
        Self {
            connection_pool,
            feed,
        }
    }

    /// Messages matching `filter`, ordered by creation time (id breaks ties)
    #[instrument(skip(self), fields(kind = %filter.kind))]
    pub async fn find_many_by_filter(&self, filter: &QueryFilter) -> Result<Vec<Message>, Error> {
        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT ");
        query.push(MESSAGE_COLUMNS);
        query.push(" FROM messages WHERE kind = ");
        query.push_bind(filter.kind);

        query.push(" AND recipient IN (");
        let mut recipients = query.separated(", ");
        for recipient in &filter.recipient_in {
            recipients.push_bind(recipient.as_str());
        }
        recipients.push_unseparated(")");

        if !filter.sender_in.is_empty() {
            query.push(" AND sender IN (");
            let mut senders = query.separated(", ");
            for sender in &filter.sender_in {
                senders.push_bind(sender.as_str());
            }
            senders.push_unseparated(")");
        }

        query.push(" ORDER BY created_at ASC, id ASC");

        let messages = query
            .build_query_as::<Message>()
            .fetch_all(&self.connection_pool)
            .await?;

        debug!(count = messages.len(), "Messages fetched");
        Ok(messages)
    }

    /// Distinct recipients of all ad-hoc group messages (the group keys)
    pub async fn find_group_recipients(&self) -> Result<Vec<String>, Error> {
        let recipients = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT recipient FROM messages WHERE kind = ? ORDER BY recipient",
        )
        .bind(MessageKind::MultiGroup)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(recipients)
    }
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    /// Inserts the message together with the author's own read receipt, then
    /// publishes the row on the change feed once the transaction is committed.
    #[instrument(skip(self, data), fields(kind = %data.kind))]
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        let created_at = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO messages (text, sender, role, kind, recipient, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&data.text)
        .bind(&data.sender)
        .bind(&data.role)
        .bind(data.kind)
        .bind(&data.recipient)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        let new_id = result.last_insert_rowid();

        // authors never count their own messages as unread
        sqlx::query(
            "INSERT OR IGNORE INTO message_reads (message_id, user_email, read_at) VALUES (?, ?, ?)",
        )
        .bind(new_id)
        .bind(&data.sender)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let message = Message {
            id: new_id,
            text: data.text.clone(),
            sender: data.sender.clone(),
            role: data.role.clone(),
            kind: data.kind,
            recipient: data.recipient.clone(),
            created_at,
        };

        let receivers = self.feed.publish(ChangeOp::Insert, message.clone());
        info!(message_id = new_id, receivers, "Message inserted");
        Ok(message)
    }
}
