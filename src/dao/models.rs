use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Sentinel vote value marking a participant as sitting this round out.
pub const SKIP_VOTE: &str = "SKIP";

/// Lifecycle status of a room node.
///
/// A room with status [`RoomStatus::Deleting`] must be treated as non-existent by
/// all readers; the flag exists so subscribed clients can tear down cleanly before
/// the node disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Room created, waiting for the first estimation round.
    Waiting,
    /// At least one action has been taken in the room.
    Active,
    /// First phase of the two-phase delete; removal is imminent.
    Deleting,
}

/// Full room subtree as stored under `rooms/{code}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEntity {
    /// Six uppercase alphanumeric characters identifying the room.
    pub room_code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Shared story text being estimated.
    #[serde(default)]
    pub story: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Timestamp of the last mutating action, epoch milliseconds.
    pub last_active: i64,
    /// Whether votes are currently visible.
    #[serde(default)]
    pub revealed: bool,
    /// Shared reveal countdown, present while one is running.
    #[serde(default)]
    pub countdown: Option<CountdownEntity>,
    /// Reset-in-progress marker shown to every client while votes are cleared.
    #[serde(default)]
    pub reset_state: Option<ResetStateEntity>,
    /// Marker surfaced to participants after a reset completed.
    #[serde(default)]
    pub reset_notification: Option<ResetNotificationEntity>,
    /// Participants keyed by their session token, in join order.
    #[serde(default)]
    pub participants: IndexMap<String, ParticipantEntity>,
}

impl RoomEntity {
    /// Build a fresh room containing only its host.
    pub fn new(room_code: String, host_session: String, host: ParticipantEntity, now: i64) -> Self {
        let mut participants = IndexMap::new();
        participants.insert(host_session, host);
        Self {
            room_code,
            status: RoomStatus::Waiting,
            story: String::new(),
            created_at: now,
            last_active: now,
            revealed: false,
            countdown: None,
            reset_state: None,
            reset_notification: None,
            participants,
        }
    }
}

/// One participant node inside a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantEntity {
    /// Display name, trimmed, 1..=50 characters.
    pub name: String,
    /// True only for the room creator, for the lifetime of the room.
    #[serde(default)]
    pub is_host: bool,
    /// False marks a facilitator who observes but never votes.
    #[serde(default = "default_true")]
    pub is_participant: bool,
    /// Current vote: a deck card, [`SKIP_VOTE`], or `None` when not cast.
    #[serde(default)]
    pub vote: Option<String>,
    /// Join timestamp in epoch milliseconds, compared against reset notifications.
    pub joined_at: i64,
    /// Advisory marker written shortly before a host removes this participant.
    #[serde(default)]
    pub kicked: Option<KickedEntity>,
}

impl ParticipantEntity {
    /// Build a participant record with no vote cast.
    pub fn new(name: impl Into<String>, is_host: bool, is_participant: bool, now: i64) -> Self {
        Self {
            name: name.into(),
            is_host,
            is_participant,
            vote: None,
            joined_at: now,
            kicked: None,
        }
    }

    /// True when the participant has opted out of the current round.
    pub fn has_skipped(&self) -> bool {
        self.vote.as_deref() == Some(SKIP_VOTE)
    }
}

/// Shared reveal countdown so every client renders the same ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CountdownEntity {
    /// Always true while present; kept for tree-shape compatibility.
    pub active: bool,
    /// Countdown start, epoch milliseconds.
    pub start_time: i64,
}

/// Reset-in-progress flag blocking interaction while votes are cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetStateEntity {
    /// Always true while present.
    pub active: bool,
    /// Reset start, epoch milliseconds.
    pub start_time: i64,
}

/// Notification written after a completed reset.
///
/// Participants whose `joined_at` predates `timestamp` are told their votes were
/// cleared; later joiners never see the notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetNotificationEntity {
    /// Moment the reset completed, epoch milliseconds.
    pub timestamp: i64,
    /// Whether the notice has been acknowledged; written as false on every reset.
    pub notified: bool,
}

/// Advisory kick marker set before the participant node is removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct KickedEntity {
    /// Moment of the kick, epoch milliseconds.
    pub timestamp: i64,
    /// Display name of the host who performed the kick.
    pub by: String,
}

fn default_true() -> bool {
    true
}
