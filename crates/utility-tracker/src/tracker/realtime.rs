//! WebSocket edge for the event broadcaster.
//!
//! Server frames are `{"event": ..., "data": ...}` JSON text messages. Clients may send
//! `join_user` with their role and area to be placed in a room, or `leave_room` with a room
//! name. Anything else is logged and ignored. Closing the socket unregisters the subscriber;
//! a reconnecting client starts with no rooms.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};

use super::broadcast::{EventBroadcaster, Room, SubscriberId, Subscription};
use super::domain::UserRole;

pub fn realtime_router(broadcaster: Arc<EventBroadcaster>) -> Router {
    Router::new()
        .route("/ws", get(upgrade_handler))
        .with_state(broadcaster)
}

async fn upgrade_handler(
    State(broadcaster): State<Arc<EventBroadcaster>>,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade.on_upgrade(move |socket| run_session(broadcaster, socket))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinUser(JoinRequest),
    LeaveRoom { room: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JoinRequest {
    #[serde(default = "default_role")]
    pub role: UserRole,
    #[serde(default)]
    pub area: String,
}

fn default_role() -> UserRole {
    UserRole::User
}

/// Apply one client text frame. Returns the room joined, if any.
pub fn apply_client_frame(
    broadcaster: &EventBroadcaster,
    id: SubscriberId,
    frame: &str,
) -> Option<Room> {
    let message = match serde_json::from_str::<ClientMessage>(frame) {
        Ok(message) => message,
        Err(err) => {
            warn!(subscriber = %id, error = %err, "ignoring unrecognised client frame");
            return None;
        }
    };

    match message {
        ClientMessage::JoinUser(request) => {
            let area = request.area.trim();
            if request.role == UserRole::User && area.is_empty() {
                warn!(subscriber = %id, "join_user without an area ignored");
                return None;
            }
            let room = Room::for_member(request.role, area);
            broadcaster.join(id, room.clone()).then_some(room)
        }
        ClientMessage::LeaveRoom { room } => {
            match Room::parse(&room) {
                Some(room) => {
                    broadcaster.leave(id, &room);
                }
                None => warn!(subscriber = %id, room = %room, "leave for unknown room ignored"),
            }
            None
        }
    }
}

async fn run_session(broadcaster: Arc<EventBroadcaster>, socket: WebSocket) {
    let Subscription { id, mut receiver } = broadcaster.subscribe();
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            outbound = receiver.recv() => {
                let Some(event) = outbound else { break };
                let text = match serde_json::to_string(&event) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!(subscriber = %id, error = %err, "failed to encode event frame");
                        continue;
                    }
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    debug!(subscriber = %id, "socket send failed");
                    break;
                }
            }
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    apply_client_frame(&broadcaster, id, &text);
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    debug!(subscriber = %id, error = %err, "socket read failed");
                    break;
                }
            },
        }
    }

    broadcaster.disconnect(id);
}
