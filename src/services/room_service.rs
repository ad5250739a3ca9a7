//! Room lifecycle operations: create, join, leave, delete, kick, story edits.

use rand::Rng;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{KickedEntity, ParticipantEntity, RoomEntity, RoomStatus},
    dto::rooms::{CreateRoomRequest, JoinRoomRequest, JoinedResponse, RoomCreatedResponse},
    error::ServiceError,
    state::{SharedState, epoch_ms, identity::SessionIdentity},
};

/// Characters a room code is drawn from. Uppercase alphanumerics only, so
/// codes can be read out loud and typed on any keyboard.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Length of a room code.
const ROOM_CODE_LEN: usize = 6;
/// Length of a session token.
const SESSION_ID_LEN: usize = 8;
/// Attempts at drawing an unused room code before giving up.
const CODE_ALLOCATION_ATTEMPTS: usize = 10;

/// Create a room with the caller as host and return their session token.
pub async fn create_room(
    state: &SharedState,
    request: CreateRoomRequest,
) -> Result<RoomCreatedResponse, ServiceError> {
    let store = state.room_store();

    // Draw codes until one is free. Collisions both with live rooms and with
    // rooms mid-deletion count as taken.
    let mut code = None;
    for _ in 0..CODE_ALLOCATION_ATTEMPTS {
        let candidate = generate_room_code();
        if store.get(&candidate).await?.is_none() {
            code = Some(candidate);
            break;
        }
        warn!(code = %candidate, "room code collision, retrying");
    }
    let Some(code) = code else {
        return Err(ServiceError::InvalidState(
            "could not allocate an unused room code".into(),
        ));
    };

    let now = epoch_ms();
    let session_id = generate_session_id();
    let host_name = request.host_name.trim().to_owned();
    let host = ParticipantEntity::new(&host_name, true, request.host_participates, now);
    store
        .put_room(RoomEntity::new(code.clone(), session_id.clone(), host, now))
        .await?;

    state.sessions().save(SessionIdentity {
        room_code: code.clone(),
        session_id: session_id.clone(),
        user_name: host_name,
        is_host: true,
        is_participant: request.host_participates,
    });

    info!(room = %code, "room created");
    Ok(RoomCreatedResponse {
        room_code: code,
        session_id,
    })
}

/// Join an existing room and return the issued session token.
pub async fn join_room(
    state: &SharedState,
    code: &str,
    request: JoinRoomRequest,
) -> Result<JoinedResponse, ServiceError> {
    let store = state.room_store();
    let room = require_room(state, code).await?;

    let name = request.name.trim().to_owned();
    if room
        .participants
        .values()
        .any(|p| p.name.eq_ignore_ascii_case(&name))
    {
        return Err(ServiceError::InvalidInput(format!(
            "name `{name}` is already taken in this room"
        )));
    }

    let now = epoch_ms();
    let session_id = generate_session_id();
    store
        .add_participant(
            code,
            &session_id,
            ParticipantEntity::new(&name, false, request.participates, now),
        )
        .await?;
    touch(state, code).await;

    state.sessions().save(SessionIdentity {
        room_code: code.to_owned(),
        session_id: session_id.clone(),
        user_name: name,
        is_host: false,
        is_participant: request.participates,
    });

    info!(room = %code, "participant joined");
    Ok(JoinedResponse { session_id })
}

/// Leave a room voluntarily. The last participant out removes the room.
pub async fn leave_room(
    state: &SharedState,
    code: &str,
    session_id: &str,
) -> Result<(), ServiceError> {
    let store = state.room_store();
    let room = require_room(state, code).await?;

    if !room.participants.contains_key(session_id) {
        // Already gone, e.g. kicked while the leave request was in flight.
        state.sessions().remove(session_id);
        return Ok(());
    }

    store.remove_participant(code, session_id).await?;
    state.sessions().remove(session_id);

    let remaining = room.participants.len().saturating_sub(1);
    if remaining == 0 {
        info!(room = %code, "last participant left, removing room");
        store.remove_room(code).await?;
        state.sessions().clear_room(code);
    } else {
        touch(state, code).await;
        info!(room = %code, remaining, "participant left");
    }
    Ok(())
}

/// Fetch a room, treating `deleting` as absent.
pub async fn require_room(state: &SharedState, code: &str) -> Result<RoomEntity, ServiceError> {
    let room = state.room_store().get(code).await?;
    match room {
        Some(room) if room.status != RoomStatus::Deleting => Ok(room),
        _ => Err(ServiceError::NotFound(format!("room `{code}` not found"))),
    }
}

/// Whether a room exists and accepts joins.
pub async fn room_exists(state: &SharedState, code: &str) -> Result<bool, ServiceError> {
    Ok(state.room_store().exists(code).await?)
}

/// Resolve and authorize the host session for a room.
pub async fn require_host(
    state: &SharedState,
    code: &str,
    session_id: &str,
) -> Result<RoomEntity, ServiceError> {
    let room = require_room(state, code).await?;
    let is_host = room
        .participants
        .get(session_id)
        .is_some_and(|p| p.is_host);
    if !is_host {
        return Err(ServiceError::Unauthorized(
            "only the host can perform this action".into(),
        ));
    }
    Ok(room)
}

/// Resolve a member session for a room, host or not.
pub async fn require_member(
    state: &SharedState,
    code: &str,
    session_id: &str,
) -> Result<RoomEntity, ServiceError> {
    let room = require_room(state, code).await?;
    if !room.participants.contains_key(session_id) {
        return Err(ServiceError::Unauthorized(
            "session does not belong to this room".into(),
        ));
    }
    Ok(room)
}

/// Update the shared story text. Host only.
pub async fn update_story(
    state: &SharedState,
    code: &str,
    session_id: &str,
    story: String,
) -> Result<(), ServiceError> {
    require_host(state, code, session_id).await?;

    let story = story.trim().to_owned();
    let max = state.config().max_story_len;
    if story.chars().count() > max {
        return Err(ServiceError::InvalidInput(format!(
            "story must be at most {max} characters"
        )));
    }

    state.room_store().set_story(code, story).await?;
    touch(state, code).await;
    Ok(())
}

/// Delete a room in two phases so subscribers can tear down cleanly.
///
/// The room is first flagged `deleting`; after the configured grace period
/// each participant node is removed individually, then the room node itself.
/// If removal fails partway the flag is rolled back so the room does not stay
/// wedged.
pub async fn delete_room(
    state: &SharedState,
    code: &str,
    session_id: &str,
) -> Result<(), ServiceError> {
    let store = state.room_store();
    let room = require_host(state, code, session_id).await?;

    state.sessions().mark_deleting(code, session_id);
    store.set_status(code, RoomStatus::Deleting).await?;
    tokio::time::sleep(state.config().delete_grace).await;

    // Per-participant removal first, then the room node. Backends that store
    // participants as child nodes rely on this order to never leave orphans.
    let result: Result<(), ServiceError> = async {
        for participant_id in room.participants.keys() {
            store.remove_participant(code, participant_id).await?;
        }
        store.remove_room(code).await?;
        Ok(())
    }
    .await;

    if let Err(err) = result {
        warn!(room = %code, error = %err, "room removal failed, rolling back deleting flag");
        if let Err(rollback) = store.set_status(code, RoomStatus::Active).await {
            warn!(room = %code, error = %rollback, "deleting flag rollback failed");
        }
        state.sessions().clear_deleting(code);
        return Err(err);
    }

    state.sessions().clear_room(code);
    info!(room = %code, "room deleted");
    Ok(())
}

/// Remove another participant from the room. Host only.
///
/// An advisory kick marker is written first so the target's client can show a
/// message before its participant node disappears.
pub async fn kick_participant(
    state: &SharedState,
    code: &str,
    session_id: &str,
    target_id: &str,
) -> Result<(), ServiceError> {
    let store = state.room_store();
    let room = require_host(state, code, session_id).await?;

    if target_id == session_id {
        return Err(ServiceError::InvalidInput(
            "hosts cannot kick themselves; delete the room instead".into(),
        ));
    }
    let Some(host) = room.participants.get(session_id) else {
        return Err(ServiceError::Unauthorized(
            "session does not belong to this room".into(),
        ));
    };
    if !room.participants.contains_key(target_id) {
        return Err(ServiceError::NotFound(format!(
            "participant `{target_id}` not found"
        )));
    }

    store
        .mark_kicked(
            code,
            target_id,
            KickedEntity {
                timestamp: epoch_ms(),
                by: host.name.clone(),
            },
        )
        .await?;
    tokio::time::sleep(state.config().kick_grace).await;

    store.remove_participant(code, target_id).await?;
    state.sessions().remove(target_id);
    touch(state, code).await;
    info!(room = %code, "participant kicked");
    Ok(())
}

/// Bump a room's last-active timestamp; failures are logged, never surfaced.
pub async fn touch(state: &SharedState, code: &str) {
    if let Err(err) = state.room_store().touch(code, epoch_ms()).await {
        warn!(room = %code, error = %err, "failed to bump last-active timestamp");
    }
}

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ROOM_CODE_ALPHABET.len());
            ROOM_CODE_ALPHABET[idx] as char
        })
        .collect()
}

fn generate_session_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..SESSION_ID_LEN].to_owned()
}
