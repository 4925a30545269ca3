//! WebSocket Connection Management

use crate::dtos::{SessionCommand, SessionEvent};
use crate::messaging::{Conversation, directory};
use crate::ws::session::{ConversationSession, run_session};
use crate::ws::sessions::InternalSignal;
use crate::ws::CLIENT_TIMEOUT_SECONDS;
use crate::AppState;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, timeout};
use tracing::{error, info, instrument, warn};

#[instrument(skip(ws, state))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, email: String) {
    info!("WebSocket connection established");

    // Split the socket: one task reads commands, one writes events
    let (ws_tx, ws_rx) = ws.split();

    let (command_tx, command_rx) = unbounded_channel::<SessionCommand>();
    let (event_tx, event_rx) = unbounded_channel::<SessionEvent>();
    let (signal_tx, signal_rx) = unbounded_channel::<InternalSignal>();

    let session_id = state.sessions.register_online(&email, signal_tx);

    if let Err(e) = directory::register(&state, &email).await {
        warn!("Failed to register address in directory: {}", e);
    }

    let listener = tokio::spawn(listen_ws(ws_rx, command_tx, event_tx.clone()));
    tokio::spawn(write_ws(ws_tx, event_rx));

    // the default view is the organization chat
    let mut session = ConversationSession::new(state.clone(), email.clone(), event_tx);
    session.open(Conversation::Broadcast).await;
    run_session(session, command_rx, signal_rx).await;

    // the reader holds an event sender too; stop it so the writer can drain and close
    listener.abort();
    state.sessions.remove_from_online(&email, session_id);
    info!("WebSocket session cleaned up");
}

#[instrument(skip_all)]
pub async fn write_ws(
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut events: UnboundedReceiver<SessionEvent>,
) {
    info!("Write task started");

    while let Some(event) = events.recv().await {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize event: {:?}", e);
                continue;
            }
        };
        if let Err(e) = websocket_tx.send(Message::Text(Utf8Bytes::from(json))).await {
            warn!("Failed to send event, closing connection: {:?}", e);
            break;
        }
    }

    // the session is gone (or the socket broke): close our half
    let _ = websocket_tx.close().await;
    info!("Write task terminated");
}

#[instrument(skip_all)]
pub async fn listen_ws(
    mut websocket_rx: SplitStream<WebSocket>,
    commands: UnboundedSender<SessionCommand>,
    events: UnboundedSender<SessionEvent>,
) {
    info!("Listen task started");
    let timeout_duration = Duration::from_secs(CLIENT_TIMEOUT_SECONDS);

    loop {
        match timeout(timeout_duration, websocket_rx.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                match serde_json::from_str::<SessionCommand>(&text) {
                    Ok(command) => {
                        if commands.send(command).is_err() {
                            info!("Session ended, stop listening");
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Failed to deserialize command: {}", e);
                        let _ = events.send(SessionEvent::Error {
                            code: 400,
                            message: "Malformed command".to_string(),
                        });
                    }
                }
            }
            Ok(Some(Ok(Message::Close(_)))) => {
                info!("Close message received");
                break;
            }
            Ok(Some(Ok(_))) => {}
            Ok(Some(Err(e))) => {
                warn!("WebSocket error: {:?}", e);
                break;
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = CLIENT_TIMEOUT_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    // dropping `commands` ends the session loop
    info!("Listen task terminated");
}
