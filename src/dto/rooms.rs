//! Room lifecycle payloads and the per-viewer room snapshot.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{CountdownEntity, RoomEntity, RoomStatus},
    dto::validation::{validate_room_code, validate_user_name},
    state::{
        room::Role,
        stats::{VoteCount, VoteStatistics, calculate_statistics, count_votes},
    },
};

/// Payload used to create a room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    /// Display name of the creator.
    pub host_name: String,
    /// False when the host only facilitates and never votes.
    #[serde(default = "default_true")]
    pub host_participates: bool,
}

impl Validate for CreateRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_user_name(&self.host_name) {
            errors.add("host_name", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to join an existing room.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRoomRequest {
    /// Display name of the joiner.
    pub name: String,
    /// False to join as a non-voting facilitator.
    #[serde(default = "default_true")]
    pub participates: bool,
}

impl Validate for JoinRoomRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_user_name(&self.name) {
            errors.add("name", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to update the shared story text.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StoryRequest {
    /// New story text; length bound is configured server-side.
    pub story: String,
}

/// Response returned after a successful room creation.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomCreatedResponse {
    /// Code of the freshly created room.
    pub room_code: String,
    /// Session token identifying the host; required on every mutating call.
    pub session_id: String,
}

/// Response returned after joining a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinedResponse {
    /// Session token identifying the new participant.
    pub session_id: String,
}

/// Response for the room existence probe used by the join form.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomExistsResponse {
    /// Whether the room exists and accepts joins.
    pub exists: bool,
}

/// One participant as seen by a specific viewer.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Participant id, identical to their session token.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Derived role.
    pub role: Role,
    /// True only for the room creator.
    pub is_host: bool,
    /// Whether a vote has been cast this round (never reveals which).
    pub has_voted: bool,
    /// Whether the participant is sitting this round out.
    pub skipped: bool,
    /// The vote value. Hidden for other participants until reveal; a viewer
    /// always sees their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote: Option<String>,
    /// Join timestamp, epoch milliseconds.
    pub joined_at: i64,
}

/// Full room view tailored to one viewer, pushed on every change.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RoomSnapshot {
    /// Room code.
    pub room_code: String,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Shared story text.
    pub story: String,
    /// Whether votes are visible.
    pub revealed: bool,
    /// Shared reveal countdown, when one is running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown: Option<CountdownEntity>,
    /// True while a reset is being applied.
    pub reset_in_progress: bool,
    /// Card values offered to voters.
    pub deck: Vec<String>,
    /// Participants in join order, votes masked for this viewer.
    pub participants: Vec<ParticipantSummary>,
    /// Round statistics; numeric aggregates appear only after reveal.
    pub statistics: VoteStatistics,
    /// Voting progress, visible before reveal.
    pub vote_count: VoteCount,
}

impl RoomSnapshot {
    /// Project a stored room into what `viewer` is allowed to see.
    ///
    /// Before reveal, other participants' vote values are withheld and only the
    /// `has_voted` and `skipped` flags escape. The viewer's own vote is always
    /// echoed back so clients need no optimistic local state.
    pub fn for_viewer(room: &RoomEntity, viewer: Option<&str>, deck: &[String]) -> Self {
        let participants = room
            .participants
            .iter()
            .map(|(id, p)| {
                let own = viewer == Some(id.as_str());
                let skipped = p.has_skipped();
                let vote = if room.revealed || own {
                    p.vote.clone()
                } else {
                    None
                };
                ParticipantSummary {
                    id: id.clone(),
                    name: p.name.clone(),
                    role: Role::of(p),
                    is_host: p.is_host,
                    has_voted: p.vote.is_some() && !skipped,
                    skipped,
                    vote,
                    joined_at: p.joined_at,
                }
            })
            .collect();

        Self {
            room_code: room.room_code.clone(),
            status: room.status,
            story: room.story.clone(),
            revealed: room.revealed,
            countdown: room.countdown,
            reset_in_progress: room.reset_state.is_some(),
            deck: deck.to_vec(),
            participants,
            statistics: calculate_statistics(&room.participants, room.revealed),
            vote_count: count_votes(&room.participants),
        }
    }
}

/// Validated path parameter wrapper for room codes.
#[derive(Debug, Deserialize)]
pub struct RoomCodeParam {
    /// The room code from the URL.
    pub code: String,
}

impl Validate for RoomCodeParam {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_room_code(&self.code) {
            errors.add("code", e);
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::{ParticipantEntity, RoomEntity, SKIP_VOTE};

    fn deck() -> Vec<String> {
        ["1", "2", "3", "5", "8", "13", "21", "?"]
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    fn room() -> RoomEntity {
        let mut room = RoomEntity::new(
            "ABC123".into(),
            "host".into(),
            ParticipantEntity::new("Hope", true, true, 1),
            1,
        );
        let mut alice = ParticipantEntity::new("Alice", false, true, 2);
        alice.vote = Some("5".into());
        room.participants.insert("alice".into(), alice);
        let mut sam = ParticipantEntity::new("Sam", false, true, 3);
        sam.vote = Some(SKIP_VOTE.into());
        room.participants.insert("sam".into(), sam);
        room
    }

    #[test]
    fn other_votes_are_masked_before_reveal() {
        let snapshot = RoomSnapshot::for_viewer(&room(), Some("host"), &deck());
        let alice = snapshot.participants.iter().find(|p| p.id == "alice").unwrap();
        assert!(alice.has_voted);
        assert_eq!(alice.vote, None);
    }

    #[test]
    fn viewer_always_sees_their_own_vote() {
        let snapshot = RoomSnapshot::for_viewer(&room(), Some("alice"), &deck());
        let alice = snapshot.participants.iter().find(|p| p.id == "alice").unwrap();
        assert_eq!(alice.vote.as_deref(), Some("5"));
    }

    #[test]
    fn reveal_unmasks_every_vote() {
        let mut revealed = room();
        revealed.revealed = true;
        let snapshot = RoomSnapshot::for_viewer(&revealed, Some("host"), &deck());
        let alice = snapshot.participants.iter().find(|p| p.id == "alice").unwrap();
        assert_eq!(alice.vote.as_deref(), Some("5"));
    }

    #[test]
    fn skipping_is_visible_but_never_counts_as_voting() {
        let snapshot = RoomSnapshot::for_viewer(&room(), Some("host"), &deck());
        let sam = snapshot.participants.iter().find(|p| p.id == "sam").unwrap();
        assert!(sam.skipped);
        assert!(!sam.has_voted);
        assert_eq!(snapshot.vote_count.total_participants, 2);
        assert_eq!(snapshot.vote_count.votes_submitted, 1);
    }

    #[test]
    fn participants_keep_join_order() {
        let snapshot = RoomSnapshot::for_viewer(&room(), None, &deck());
        let ids: Vec<&str> = snapshot.participants.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["host", "alice", "sam"]);
    }
}
