//! Integration tests for the repositories
//!
//! Exercises the SQL directly, below the messaging layer.

mod common;

#[cfg(test)]
mod repository_tests {
    use super::common::*;
    use rescue_chat::dtos::CreateMessageDTO;
    use rescue_chat::entities::{ChangeOp, Message, MessageKind};
    use rescue_chat::repositories::Create;
    use sqlx::SqlitePool;

    fn draft(sender: &str, kind: MessageKind, recipient: &str, text: &str) -> CreateMessageDTO {
        CreateMessageDTO {
            text: text.to_string(),
            sender: sender.to_string(),
            role: "Volunteer".to_string(),
            kind,
            recipient: recipient.to_string(),
        }
    }

    async fn receipt_count(pool: &SqlitePool, message_id: i64, email: &str) -> sqlx::Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM message_reads WHERE message_id = ? AND user_email = ?")
            .bind(message_id)
            .bind(email)
            .fetch_one(pool)
            .await
    }

    #[sqlx::test]
    async fn test_create_publishes_and_reads_back(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let mut feed = state.feed.subscribe();

        let created = state
            .msg
            .create(&draft("ann@rescue.org", MessageKind::Group, "group", "hello"))
            .await?;

        let event = feed.try_recv().expect("insert published on the feed");
        assert_eq!(event.op, ChangeOp::Insert);
        assert_eq!(event.row, created);

        let stored: Message = sqlx::query_as(
            "SELECT id, text, sender, role, kind, recipient, created_at FROM messages WHERE id = ?",
        )
        .bind(created.id)
        .fetch_one(&pool)
        .await?;
        assert_eq!(stored.id, created.id);
        assert_eq!(stored.text, "hello");
        assert_eq!(stored.kind, MessageKind::Group);
        Ok(())
    }

    #[sqlx::test]
    async fn test_author_receipt_written_with_message(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());

        let created = state
            .msg
            .create(&draft("ann@rescue.org", MessageKind::Dm, "ben@rescue.org", "hi"))
            .await?;

        assert_eq!(receipt_count(&pool, created.id, "ann@rescue.org").await?, 1);
        assert_eq!(receipt_count(&pool, created.id, "ben@rescue.org").await?, 0);
        Ok(())
    }

    #[sqlx::test]
    async fn test_mark_many_ignores_existing_receipts(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let first = state
            .msg
            .create(&draft("ann@rescue.org", MessageKind::Group, "group", "hello"))
            .await?;
        let second = state
            .msg
            .create(&draft("ann@rescue.org", MessageKind::Group, "group", "again"))
            .await?;

        let inserted = state.reads.mark_many(&[first.id], "ben@rescue.org").await?;
        assert_eq!(inserted, 1);

        let inserted = state
            .reads
            .mark_many(&[first.id, second.id], "ben@rescue.org")
            .await?;
        assert_eq!(inserted, 1);
        assert_eq!(receipt_count(&pool, first.id, "ben@rescue.org").await?, 1);
        assert_eq!(state.reads.mark_many(&[], "ben@rescue.org").await?, 0);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../fixtures", scripts("messages")))]
    async fn test_group_recipients_are_distinct(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        state
            .msg
            .create(&draft(
                "bob@rescue.org",
                MessageKind::MultiGroup,
                "alice@rescue.org;bob@rescue.org;carol@rescue.org",
                "second message in the group",
            ))
            .await?;

        let recipients = state.msg.find_group_recipients().await?;
        assert_eq!(
            recipients,
            vec!["alice@rescue.org;bob@rescue.org;carol@rescue.org".to_string()]
        );
        Ok(())
    }
}
