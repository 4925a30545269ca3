//! Integration tests for the realtime conversation session
//!
//! The session is driven directly through its channels, the way the socket
//! tasks drive it, against a real database and change feed.

mod common;

#[cfg(test)]
mod session_tests {
    use super::common::*;
    use rescue_chat::dtos::{ConversationQuery, SessionCommand, SessionEvent};
    use rescue_chat::messaging::{Conversation, ConversationMode, gateway};
    use rescue_chat::ws::{ConversationSession, InternalSignal, SessionState, run_session};
    use sqlx::SqlitePool;
    use tokio::sync::mpsc::{self, UnboundedReceiver};
    use tokio::time::{Duration, timeout};
    use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

    fn drain(rx: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn message_views(events: &[SessionEvent]) -> Vec<&SessionEvent> {
        events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Messages { .. }))
            .collect()
    }

    // ============================================================
    // Feed handling
    // ============================================================

    #[sqlx::test]
    async fn test_unrelated_insert_notifies_without_refresh(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state.clone(), "ann@rescue.org".into(), tx);

        session.open(Conversation::direct("ben@rescue.org")).await;
        drain(&mut rx);

        gateway::send(
            &state,
            "cal@rescue.org",
            &Conversation::direct("dan@rescue.org"),
            "not for ann",
        )
        .await
        .unwrap();

        let Some(Ok(event)) = session.next_change().await else {
            panic!("expected a change event");
        };
        let outcome = session.handle_change(&event).await;
        assert!(outcome.notified);
        assert!(!outcome.refreshed);

        let events = drain(&mut rx);
        assert!(message_views(&events).is_empty());
        assert!(events.iter().any(|e| matches!(e, SessionEvent::Notification(_))));
        assert!(events.iter().any(|e| matches!(e, SessionEvent::Badges(_))));
        assert!(events.iter().any(|e| matches!(e, SessionEvent::Groups(_))));
        Ok(())
    }

    #[sqlx::test]
    async fn test_insert_into_open_thread_refreshes_view(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state.clone(), "ann@rescue.org".into(), tx);

        session.open(Conversation::direct("ben@rescue.org")).await;
        drain(&mut rx);

        gateway::send(
            &state,
            "ben@rescue.org",
            &Conversation::direct("ann@rescue.org"),
            "walk at 5?",
        )
        .await
        .unwrap();

        let Some(Ok(event)) = session.next_change().await else {
            panic!("expected a change event");
        };
        let outcome = session.handle_change(&event).await;
        assert!(outcome.notified);
        assert!(outcome.refreshed);

        let notification = session.notification().expect("notification raised");
        assert_eq!(notification.text, "New Message from: ben@rescue.org (dm)");

        let events = drain(&mut rx);
        let views = message_views(&events);
        assert_eq!(views.len(), 1);
        if let SessionEvent::Messages { messages, .. } = views[0] {
            assert_eq!(messages.len(), 1);
            assert_eq!(messages[0].text, "walk at 5?");
        }

        // the refresh recorded the read, so ben is no longer an unread peer
        let badges = events
            .iter()
            .rev()
            .find_map(|e| match e {
                SessionEvent::Badges(badges) => Some(badges.clone()),
                _ => None,
            })
            .expect("badges recomputed");
        assert!(badges.dm_unread_peers.is_empty());
        Ok(())
    }

    #[sqlx::test]
    async fn test_own_message_is_neither_notified_nor_refetched(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state.clone(), "ann@rescue.org".into(), tx);

        session.open(Conversation::Broadcast).await;
        drain(&mut rx);

        let sent = session.send("supplies arrived").await.unwrap();
        let events = drain(&mut rx);
        assert_eq!(message_views(&events).len(), 1);

        let Some(Ok(event)) = session.next_change().await else {
            panic!("expected a change event");
        };
        assert_eq!(event.row.id, sent.id);
        let outcome = session.handle_change(&event).await;
        assert!(!outcome.notified);
        assert!(!outcome.refreshed);
        assert!(session.notification().is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_lag_triggers_full_refresh(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state, "ann@rescue.org".into(), tx);

        session.open(Conversation::Broadcast).await;
        drain(&mut rx);

        session
            .on_feed_item(Some(Err(BroadcastStreamRecvError::Lagged(12))))
            .await;

        let events = drain(&mut rx);
        assert_eq!(message_views(&events).len(), 1);
        assert_eq!(session.state(), SessionState::Subscribed);
        Ok(())
    }

    #[sqlx::test]
    async fn test_failed_recompute_keeps_previous_badges(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool.clone());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state, "ann@rescue.org".into(), tx);

        session.open(Conversation::Broadcast).await;
        let opened = drain(&mut rx);
        assert!(opened.iter().any(|e| matches!(e, SessionEvent::Badges(_))));

        sqlx::query("DROP TABLE message_reads").execute(&pool).await?;
        session
            .on_feed_item(Some(Err(BroadcastStreamRecvError::Lagged(1))))
            .await;

        // the view and groups still refresh; no badge update replaces the last good one
        let events = drain(&mut rx);
        assert_eq!(message_views(&events).len(), 1);
        assert!(events.iter().any(|e| matches!(e, SessionEvent::Groups(_))));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::Badges(_))));
        assert!(!events.iter().any(|e| matches!(e, SessionEvent::Error { .. })));
        Ok(())
    }

    #[sqlx::test]
    async fn test_closed_feed_releases_subscription(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state, "ann@rescue.org".into(), tx);

        session.open(Conversation::Broadcast).await;
        session.on_feed_item(None).await;

        assert_eq!(session.state(), SessionState::Idle);
        Ok(())
    }

    // ============================================================
    // Subscription lifecycle
    // ============================================================

    #[sqlx::test]
    async fn test_reopen_keeps_a_single_subscription(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state.clone(), "ann@rescue.org".into(), tx);

        assert_eq!(session.state(), SessionState::Idle);
        session.open(Conversation::Broadcast).await;
        assert_eq!(state.feed.subscriber_count(), 1);

        session.open(Conversation::direct("ben@rescue.org")).await;
        assert_eq!(state.feed.subscriber_count(), 1);
        assert_eq!(session.conversation(), &Conversation::direct("ben@rescue.org"));

        session.close();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(state.feed.subscriber_count(), 0);
        Ok(())
    }

    #[sqlx::test]
    async fn test_idle_session_receives_nothing(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state.clone(), "ann@rescue.org".into(), tx);

        gateway::send(&state, "ben@rescue.org", &Conversation::Broadcast, "hello")
            .await
            .unwrap();

        let pending = timeout(Duration::from_millis(50), session.next_change()).await;
        assert!(pending.is_err());
        Ok(())
    }

    #[sqlx::test]
    async fn test_opening_dismisses_notification(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state.clone(), "ann@rescue.org".into(), tx);

        session.open(Conversation::Broadcast).await;
        gateway::send(&state, "ben@rescue.org", &Conversation::Broadcast, "hello")
            .await
            .unwrap();
        let Some(Ok(event)) = session.next_change().await else {
            panic!("expected a change event");
        };
        session.handle_change(&event).await;
        assert!(session.notification().is_some());
        drain(&mut rx);

        session.open(Conversation::direct("ben@rescue.org")).await;
        assert!(session.notification().is_none());
        assert!(drain(&mut rx).contains(&SessionEvent::NotificationDismissed));
        Ok(())
    }

    // ============================================================
    // Commands
    // ============================================================

    #[sqlx::test]
    async fn test_send_without_selection_reports_error(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state, "ann@rescue.org".into(), tx);

        session.open(Conversation::Group { key: None }).await;
        let events = drain(&mut rx);
        if let Some(SessionEvent::Messages { prompt, messages, .. }) = message_views(&events).first()
        {
            assert!(messages.is_empty());
            assert!(prompt.is_some());
        } else {
            panic!("expected an empty view");
        }

        assert!(session.send("anyone?").await.is_err());
        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::Error { code: 400, .. })));
        Ok(())
    }

    #[sqlx::test]
    async fn test_create_group_switches_conversation(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = ConversationSession::new(state, "ann@rescue.org".into(), tx);

        session.open(Conversation::Broadcast).await;
        drain(&mut rx);

        let group = session
            .create_group(&["ben@rescue.org".to_string(), "cal@rescue.org".to_string()])
            .await
            .unwrap();
        assert_eq!(group.key, "ann@rescue.org;ben@rescue.org;cal@rescue.org");

        let events = drain(&mut rx);
        assert!(matches!(events.first(), Some(SessionEvent::GroupCreated(_))));
        let query = ConversationQuery::from(session.conversation());
        assert_eq!(query.mode, ConversationMode::Group);
        assert_eq!(query.group.as_deref(), Some(group.key.as_str()));
        Ok(())
    }

    #[sqlx::test]
    async fn test_run_session_stops_on_close_command(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (_signal_tx, signal_rx) = mpsc::unbounded_channel::<InternalSignal>();

        let mut session = ConversationSession::new(state, "ann@rescue.org".into(), event_tx);
        session.open(Conversation::Broadcast).await;
        let handle = tokio::spawn(run_session(session, command_rx, signal_rx));

        command_tx
            .send(SessionCommand::Send {
                text: "on my way".to_string(),
            })
            .unwrap();
        command_tx.send(SessionCommand::Close).unwrap();

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("session should stop")
            .unwrap();

        let events = drain(&mut event_rx);
        let last_view = message_views(&events).into_iter().last().cloned();
        match last_view {
            Some(SessionEvent::Messages { messages, .. }) => {
                assert_eq!(messages.last().map(|m| m.text.as_str()), Some("on my way"));
            }
            _ => panic!("expected a refreshed view after sending"),
        }
        Ok(())
    }

    #[sqlx::test]
    async fn test_replaced_session_is_shut_down(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let (event_tx, _event_rx) = mpsc::unbounded_channel();
        let (_command_tx, command_rx) = mpsc::unbounded_channel::<SessionCommand>();
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();

        let first_id = state.sessions.register_online("ann@rescue.org", signal_tx);
        let mut session = ConversationSession::new(state.clone(), "ann@rescue.org".into(), event_tx);
        session.open(Conversation::Broadcast).await;
        let handle = tokio::spawn(run_session(session, command_rx, signal_rx));

        // a second connection for the same principal takes over
        let (second_tx, _second_rx) = mpsc::unbounded_channel();
        let second_id = state.sessions.register_online("ann@rescue.org", second_tx);
        assert_ne!(first_id, second_id);

        timeout(Duration::from_secs(5), handle)
            .await
            .expect("old session should stop")
            .unwrap();
        assert_eq!(state.feed.subscriber_count(), 0);

        // the old session cleaning up must not unregister its successor
        state.sessions.remove_from_online("ann@rescue.org", first_id);
        assert!(state.sessions.is_user_online("ann@rescue.org"));
        Ok(())
    }
}
