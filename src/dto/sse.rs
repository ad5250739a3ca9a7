//! Event payloads carried on the per-room SSE stream.

use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::rooms::RoomSnapshot;
use crate::state::session::SessionNotice;

/// Event name for a room snapshot push.
pub const EVENT_SNAPSHOT: &str = "room.snapshot";
/// Event name asking the client to collect a display name.
pub const EVENT_AWAITING_NAME: &str = "session.awaiting_name";
/// Event name for user-facing notices.
pub const EVENT_NOTICE: &str = "session.notice";
/// Event name instructing the client to navigate away.
pub const EVENT_REDIRECT: &str = "session.redirect";

#[derive(Clone, Debug)]
/// Dispatched payload carried across the SSE channel.
pub struct ServerEvent {
    /// SSE event name.
    pub event: String,
    /// Serialised JSON data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<T>(event: &str, payload: &T) -> serde_json::Result<Self>
    where
        T: Serialize,
    {
        Ok(Self {
            event: event.to_string(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Snapshot push.
    pub fn snapshot(snapshot: &RoomSnapshot) -> serde_json::Result<Self> {
        Self::json(EVENT_SNAPSHOT, snapshot)
    }

    /// Name prompt for anonymous viewers.
    pub fn awaiting_name() -> serde_json::Result<Self> {
        Self::json(EVENT_AWAITING_NAME, &AwaitingNamePayload { prompt: true })
    }

    /// User-facing notice.
    pub fn notice(notice: SessionNotice) -> serde_json::Result<Self> {
        Self::json(EVENT_NOTICE, &NoticePayload::from(notice))
    }

    /// Delayed redirect instruction.
    pub fn redirect(after_ms: u64) -> serde_json::Result<Self> {
        Self::json(EVENT_REDIRECT, &RedirectPayload { after_ms })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Sent once when a viewer without an identity connects.
pub struct AwaitingNamePayload {
    /// Always true; presence of the event is the signal.
    pub prompt: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// User-facing notice pushed when a hazard fires.
pub struct NoticePayload {
    /// Stable machine-readable kind.
    pub kind: String,
    /// Human-readable message a client may show verbatim.
    pub message: String,
}

impl From<SessionNotice> for NoticePayload {
    fn from(notice: SessionNotice) -> Self {
        let (kind, message) = match notice {
            SessionNotice::RoomMissing => ("room_missing", "This room does not exist."),
            SessionNotice::RoomDeleted => ("room_deleted", "This room has been deleted."),
            SessionNotice::RoomDeleting => ("room_deleting", "This room is being deleted."),
            SessionNotice::Kicked => ("kicked", "You have been removed from the room."),
            SessionNotice::VotesReset => ("votes_reset", "All votes have been reset by the host."),
        };
        Self {
            kind: kind.to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Instructs the client to leave the room page after a delay.
pub struct RedirectPayload {
    /// Milliseconds to keep any notice on screen before navigating.
    pub after_ms: u64,
}
