//! Realtime Notifier - Per-connection conversation session
//!
//! A session owns the active conversation of one principal and at most one
//! subscription to the change feed. Everything it has to tell the client is
//! emitted as a [`SessionEvent`] on an mpsc channel; the socket writer is the
//! only consumer.
//!
//! For every inserted message the session:
//! 1. stays quiet if the message is the principal's own,
//! 2. otherwise raises a notification,
//! 3. re-fetches the whole conversation when the message belongs to it,
//! 4. recomputes badges and the group list in any case.

use crate::core::AppState;
use crate::dtos::{
    ConversationQuery, GroupDTO, MessageDTO, NotificationDTO, SessionCommand, SessionEvent,
};
use crate::entities::{ChangeOp, Message};
use crate::messaging::{Conversation, MessagingResult, gateway, groups, read_tracking};
use crate::ws::feed::ChangeEvent;
use crate::ws::sessions::InternalSignal;
use std::collections::HashSet;
use std::future;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, info, instrument, warn};

type FeedItem = Option<Result<Arc<ChangeEvent>, BroadcastStreamRecvError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Subscribed,
}

/// What a feed event caused, mostly useful to tests and logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeOutcome {
    pub notified: bool,
    pub refreshed: bool,
}

pub struct ConversationSession {
    state: Arc<AppState>,
    me: String,
    conversation: Conversation,
    subscription: Option<BroadcastStream<Arc<ChangeEvent>>>,
    // ids currently displayed, used to skip refreshes for rows already shown
    shown: HashSet<i64>,
    notification: Option<NotificationDTO>,
    events: UnboundedSender<SessionEvent>,
}

impl ConversationSession {
    pub fn new(state: Arc<AppState>, me: String, events: UnboundedSender<SessionEvent>) -> Self {
        Self {
            state,
            me,
            conversation: Conversation::Broadcast,
            subscription: None,
            shown: HashSet::new(),
            notification: None,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.subscription.is_some() {
            SessionState::Subscribed
        } else {
            SessionState::Idle
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn notification(&self) -> Option<&NotificationDTO> {
        self.notification.as_ref()
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped, client gone");
        }
    }

    /// Makes `conversation` the active one.
    ///
    /// The previous subscription is released before the new one is taken,
    /// and the new one exists before the first fetch so no insert can fall
    /// between the two.
    #[instrument(skip(self), fields(me = %self.me))]
    pub async fn open(&mut self, conversation: Conversation) {
        self.subscription = None;
        self.shown.clear();

        if self.me.is_empty() {
            warn!("Unknown principal, session stays idle");
            return;
        }

        self.conversation = conversation;
        self.subscription = Some(BroadcastStream::new(self.state.feed.subscribe()));
        info!(title = %self.conversation.title(), "Conversation opened");

        if self.notification.is_some() {
            self.dismiss();
        }
        self.refresh().await;
    }

    /// Releases the feed subscription. The session can be re-opened later.
    pub fn close(&mut self) {
        if self.subscription.take().is_some() {
            info!(me = %self.me, "Feed subscription released");
        }
    }

    pub fn dismiss(&mut self) {
        self.notification = None;
        self.emit(SessionEvent::NotificationDismissed);
    }

    /// Messages, badges and groups, in that order.
    pub async fn refresh(&mut self) {
        self.refresh_view().await;
        self.refresh_badges().await;
        self.refresh_groups().await;
    }

    /// Full re-fetch of the active conversation. On failure the previous
    /// content stays on screen.
    async fn refresh_view(&mut self) {
        match gateway::load(&self.state, &self.conversation, &self.me).await {
            Ok(messages) => {
                self.shown = messages.iter().map(|m| m.id).collect();
                let prompt = messages
                    .is_empty()
                    .then(|| self.conversation.empty_prompt(&self.me).to_string());
                self.emit(SessionEvent::Messages {
                    conversation: ConversationQuery::from(&self.conversation),
                    title: self.conversation.title(),
                    prompt,
                    messages: messages.into_iter().map(MessageDTO::from).collect(),
                });
            }
            Err(e) => warn!("Failed to refresh conversation: {}", e),
        }
    }

    async fn refresh_badges(&mut self) {
        match read_tracking::badges(&self.state, &self.me).await {
            Ok(badges) => self.emit(SessionEvent::Badges(badges)),
            Err(e) => warn!("Failed to recompute unread badges: {}", e),
        }
    }

    async fn refresh_groups(&mut self) {
        match groups::list_groups(&self.state, &self.me).await {
            Ok(keys) => self.emit(SessionEvent::Groups(
                keys.into_iter().map(GroupDTO::from).collect(),
            )),
            Err(e) => warn!("Failed to list private groups: {}", e),
        }
    }

    /// Posts into the active conversation and re-fetches it right away, so
    /// the author does not depend on the feed to see their own message.
    #[instrument(skip(self, text), fields(me = %self.me))]
    pub async fn send(&mut self, text: &str) -> MessagingResult<Message> {
        let result = gateway::send(&self.state, &self.me, &self.conversation, text).await;
        match &result {
            Ok(_) => self.refresh().await,
            Err(e) => {
                warn!("Send failed: {}", e);
                self.emit(SessionEvent::Error {
                    code: e.status_code(),
                    message: e.to_string(),
                });
            }
        }
        result
    }

    /// Creates the group and switches to it.
    #[instrument(skip(self, members), fields(me = %self.me))]
    pub async fn create_group(&mut self, members: &[String]) -> MessagingResult<GroupDTO> {
        match groups::create_group(&self.state, &self.me, members).await {
            Ok(key) => {
                let dto = GroupDTO::from(key.clone());
                self.emit(SessionEvent::GroupCreated(dto.clone()));
                self.open(Conversation::group(key)).await;
                Ok(dto)
            }
            Err(e) => {
                warn!("Group creation failed: {}", e);
                self.emit(SessionEvent::Error {
                    code: e.status_code(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Next item of the feed. Never resolves while the session is idle.
    pub async fn next_change(&mut self) -> FeedItem {
        match self.subscription.as_mut() {
            Some(stream) => stream.next().await,
            None => future::pending().await,
        }
    }

    pub async fn on_feed_item(&mut self, item: FeedItem) {
        match item {
            Some(Ok(event)) => {
                self.handle_change(&event).await;
            }
            Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                warn!(skipped, "Feed receiver lagged, resynchronizing");
                self.refresh().await;
            }
            None => {
                warn!("Change feed closed");
                self.close();
            }
        }
    }

    /// Applies one feed event to the session.
    #[instrument(skip(self, event), fields(me = %self.me, message_id = event.row.id))]
    pub async fn handle_change(&mut self, event: &ChangeEvent) -> ChangeOutcome {
        if event.op != ChangeOp::Insert {
            // rows are immutable, nothing else can change what is displayed
            debug!(op = ?event.op, "Ignoring non-insert change");
            return ChangeOutcome::default();
        }

        let row = &event.row;
        let mut outcome = ChangeOutcome::default();

        if row.sender != self.me {
            let notification = NotificationDTO::from(row);
            self.notification = Some(notification.clone());
            self.emit(SessionEvent::Notification(notification));
            outcome.notified = true;
        }

        if self.conversation.matches(&self.me, row) {
            if self.shown.contains(&row.id) {
                debug!("Message already displayed, skipping refresh");
            } else {
                self.refresh_view().await;
                outcome.refreshed = true;
            }
        }

        self.refresh_badges().await;
        self.refresh_groups().await;
        outcome
    }

    /// Returns `false` when the client asked to end the session.
    pub async fn handle_command(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Open(query) => self.open(query.into_conversation()).await,
            SessionCommand::Send { text } => {
                let _ = self.send(&text).await;
            }
            SessionCommand::CreateGroup { members } => {
                let _ = self.create_group(&members).await;
            }
            SessionCommand::Refresh => self.refresh().await,
            SessionCommand::Dismiss => self.dismiss(),
            SessionCommand::Close => return false,
        }
        true
    }
}

/// Drives a session until the client closes, the command channel drops, or
/// the session map shuts it down. Commands and feed events are processed one
/// at a time.
#[instrument(skip_all, fields(me = %session.me))]
pub async fn run_session(
    mut session: ConversationSession,
    mut commands: UnboundedReceiver<SessionCommand>,
    mut signals: UnboundedReceiver<InternalSignal>,
) {
    info!("Session loop started");

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => {
                    if !session.handle_command(command).await {
                        info!("Close requested by client");
                        break;
                    }
                }
                None => {
                    info!("Command channel closed");
                    break;
                }
            },

            signal = signals.recv() => match signal {
                Some(InternalSignal::Shutdown) => {
                    info!("Shutdown signal received");
                    break;
                }
                None => {
                    info!("Signal channel closed");
                    break;
                }
            },

            item = session.next_change() => session.on_feed_item(item).await,
        }
    }

    session.close();
    info!("Session loop terminated");
}
