//! Voting round operations: cast, skip, reveal with countdown, reset.

use std::time::Duration;

use tracing::{info, warn};

use crate::{
    dao::models::{
        CountdownEntity, ResetNotificationEntity, ResetStateEntity, RoomEntity, RoomStatus,
        SKIP_VOTE,
    },
    dto::voting::{CountdownStartedResponse, ResetRequest, VoteRequest},
    error::ServiceError,
    services::room_service,
    state::{SharedState, epoch_ms, room::Role},
};

/// Cast a vote for the current round.
pub async fn cast_vote(
    state: &SharedState,
    code: &str,
    session_id: &str,
    request: VoteRequest,
) -> Result<(), ServiceError> {
    let room = room_service::require_member(state, code, session_id).await?;
    ensure_voting_open(&room)?;
    ensure_voter(&room, session_id)?;

    // Skipping is left explicitly, never overwritten by a vote.
    if room
        .participants
        .get(session_id)
        .is_some_and(|p| p.has_skipped())
    {
        return Err(ServiceError::InvalidState(
            "caller is skipping this round; rejoin it before voting".into(),
        ));
    }

    if !state.config().is_deck_value(&request.value) {
        return Err(ServiceError::InvalidInput(format!(
            "`{}` is not a card in the deck",
            request.value
        )));
    }

    state
        .room_store()
        .set_vote(code, session_id, Some(request.value))
        .await?;
    activate_room(state, &room).await?;
    room_service::touch(state, code).await;
    Ok(())
}

/// Sit the current round out.
pub async fn skip_round(
    state: &SharedState,
    code: &str,
    session_id: &str,
) -> Result<(), ServiceError> {
    let room = room_service::require_member(state, code, session_id).await?;
    ensure_voting_open(&room)?;
    ensure_voter(&room, session_id)?;

    state
        .room_store()
        .set_vote(code, session_id, Some(SKIP_VOTE.to_owned()))
        .await?;
    activate_room(state, &room).await?;
    room_service::touch(state, code).await;
    Ok(())
}

/// Rejoin the round after skipping it; clears the skip sentinel.
pub async fn unskip_round(
    state: &SharedState,
    code: &str,
    session_id: &str,
) -> Result<(), ServiceError> {
    let room = room_service::require_member(state, code, session_id).await?;
    ensure_voting_open(&room)?;

    let skipped = room
        .participants
        .get(session_id)
        .is_some_and(|p| p.has_skipped());
    if !skipped {
        return Err(ServiceError::InvalidState(
            "participant is not skipping this round".into(),
        ));
    }

    state.room_store().set_vote(code, session_id, None).await?;
    room_service::touch(state, code).await;
    Ok(())
}

/// Start the shared reveal countdown. Host only.
///
/// The countdown is the single source of truth for every client's ticker; the
/// reveal itself happens server-side when the timer fires, so closing the
/// host's tab mid-countdown no longer leaves the room stuck.
pub async fn start_reveal(
    state: &SharedState,
    code: &str,
    session_id: &str,
) -> Result<CountdownStartedResponse, ServiceError> {
    let room = room_service::require_host(state, code, session_id).await?;

    if room.revealed {
        return Err(ServiceError::InvalidState(
            "votes are already revealed".into(),
        ));
    }
    if room.countdown.is_some() {
        return Err(ServiceError::InvalidState(
            "a reveal countdown is already running".into(),
        ));
    }

    let start_time = epoch_ms();
    let seconds = state.config().countdown_secs;
    state
        .room_store()
        .set_countdown(
            code,
            Some(CountdownEntity {
                active: true,
                start_time,
            }),
        )
        .await?;
    room_service::touch(state, code).await;

    spawn_reveal_timer(state.clone(), code.to_owned(), start_time, seconds);
    info!(room = %code, seconds, "reveal countdown started");
    Ok(CountdownStartedResponse {
        start_time,
        seconds,
    })
}

/// Cancel a running reveal countdown. Host only.
pub async fn cancel_reveal(
    state: &SharedState,
    code: &str,
    session_id: &str,
) -> Result<(), ServiceError> {
    let room = room_service::require_host(state, code, session_id).await?;

    if room.countdown.is_none() {
        return Err(ServiceError::InvalidState(
            "no reveal countdown is running".into(),
        ));
    }

    state.room_store().set_countdown(code, None).await?;
    room_service::touch(state, code).await;
    info!(room = %code, "reveal countdown cancelled");
    Ok(())
}

/// Clear every vote and start a fresh round. Host only, explicit confirmation
/// required.
///
/// A reset-in-progress marker blocks interaction while votes are cleared, and
/// a notification is left behind so participants who were in the room before
/// the reset learn their votes are gone.
pub async fn reset_round(
    state: &SharedState,
    code: &str,
    session_id: &str,
    request: ResetRequest,
) -> Result<(), ServiceError> {
    if !request.confirm {
        return Err(ServiceError::InvalidInput(
            "reset requires explicit confirmation".into(),
        ));
    }
    let room = room_service::require_host(state, code, session_id).await?;

    let store = state.room_store();
    let now = epoch_ms();
    store
        .set_reset_state(
            code,
            Some(ResetStateEntity {
                active: true,
                start_time: now,
            }),
        )
        .await?;

    let result: Result<(), ServiceError> = async {
        store.set_revealed(code, false).await?;
        store.set_countdown(code, None).await?;
        for participant_id in room.participants.keys() {
            store.set_vote(code, participant_id, None).await?;
        }
        store
            .set_reset_notification(
                code,
                Some(ResetNotificationEntity {
                    timestamp: epoch_ms(),
                    notified: false,
                }),
            )
            .await?;
        Ok(())
    }
    .await;

    // Clear the in-progress marker whether or not the reset went through, so a
    // failed reset never leaves the room locked.
    if let Err(err) = store.set_reset_state(code, None).await {
        warn!(room = %code, error = %err, "failed to clear reset marker");
    }
    result?;

    room_service::touch(state, code).await;
    info!(room = %code, "round reset");
    Ok(())
}

/// Room state must allow vote changes.
fn ensure_voting_open(room: &RoomEntity) -> Result<(), ServiceError> {
    if room.revealed {
        return Err(ServiceError::InvalidState(
            "votes are revealed; wait for the host to reset the round".into(),
        ));
    }
    if room.countdown.is_some() {
        return Err(ServiceError::InvalidState(
            "votes are locked while the reveal countdown runs".into(),
        ));
    }
    if room.reset_state.is_some() {
        return Err(ServiceError::InvalidState(
            "a reset is in progress".into(),
        ));
    }
    Ok(())
}

/// Facilitators observe; they never hold a vote.
fn ensure_voter(room: &RoomEntity, session_id: &str) -> Result<(), ServiceError> {
    let votes = room
        .participants
        .get(session_id)
        .is_some_and(|p| Role::of(p).votes());
    if !votes {
        return Err(ServiceError::Unauthorized(
            "facilitators do not vote".into(),
        ));
    }
    Ok(())
}

/// Flip a waiting room to active on its first action.
async fn activate_room(state: &SharedState, room: &RoomEntity) -> Result<(), ServiceError> {
    if room.status == RoomStatus::Waiting {
        state
            .room_store()
            .set_status(&room.room_code, RoomStatus::Active)
            .await?;
    }
    Ok(())
}

/// Reveal the votes once the countdown elapses, unless it was cancelled or the
/// room went away in the meantime.
fn spawn_reveal_timer(state: SharedState, code: String, start_time: i64, seconds: u64) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(seconds)).await;

        let store = state.room_store();
        let room = match store.get(&code).await {
            Ok(Some(room)) => room,
            Ok(None) => return,
            Err(err) => {
                warn!(room = %code, error = %err, "reveal timer could not read room");
                return;
            }
        };
        if room.status == RoomStatus::Deleting {
            return;
        }
        // A different start time means this countdown was cancelled and a new
        // one started; that one owns the reveal.
        if room.countdown.map(|c| c.start_time) != Some(start_time) {
            return;
        }

        if let Err(err) = store.set_revealed(&code, true).await {
            warn!(room = %code, error = %err, "reveal timer failed to set revealed");
            return;
        }
        if let Err(err) = store.set_countdown(&code, None).await {
            warn!(room = %code, error = %err, "reveal timer failed to clear countdown");
        }
        info!(room = %code, "votes revealed");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dto::rooms::{CreateRoomRequest, JoinRoomRequest},
        state::AppState,
    };

    async fn room_with_two(state: &SharedState) -> (String, String, String) {
        let created = room_service::create_room(
            state,
            CreateRoomRequest {
                host_name: "Hope".into(),
                host_participates: true,
            },
        )
        .await
        .unwrap();
        let joined = room_service::join_room(
            state,
            &created.room_code,
            JoinRoomRequest {
                name: "Alice".into(),
                participates: true,
            },
        )
        .await
        .unwrap();
        (created.room_code, created.session_id, joined.session_id)
    }

    fn fast_state() -> SharedState {
        let config = AppConfig {
            countdown_secs: 0,
            ..AppConfig::default()
        };
        AppState::new(config)
    }

    #[tokio::test]
    async fn voting_rejects_values_outside_the_deck() {
        let state = fast_state();
        let (code, _host, member) = room_with_two(&state).await;

        let err = cast_vote(&state, &code, &member, VoteRequest { value: "4".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        cast_vote(&state, &code, &member, VoteRequest { value: "5".into() })
            .await
            .unwrap();
        let room = room_service::require_room(&state, &code).await.unwrap();
        assert_eq!(room.status, RoomStatus::Active);
        assert_eq!(
            room.participants.get(member.as_str()).unwrap().vote.as_deref(),
            Some("5")
        );
    }

    #[tokio::test]
    async fn facilitators_cannot_vote_or_skip() {
        let state = fast_state();
        let created = room_service::create_room(
            &state,
            CreateRoomRequest {
                host_name: "Hope".into(),
                host_participates: true,
            },
        )
        .await
        .unwrap();
        let observer = room_service::join_room(
            &state,
            &created.room_code,
            JoinRoomRequest {
                name: "Obs".into(),
                participates: false,
            },
        )
        .await
        .unwrap();

        let err = cast_vote(
            &state,
            &created.room_code,
            &observer.session_id,
            VoteRequest { value: "5".into() },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        let err = skip_round(&state, &created.room_code, &observer.session_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn voting_while_skipping_is_rejected() {
        let state = fast_state();
        let (code, _host, member) = room_with_two(&state).await;

        skip_round(&state, &code, &member).await.unwrap();
        let err = cast_vote(&state, &code, &member, VoteRequest { value: "5".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        // The skip sentinel survives the rejected attempt.
        let room = room_service::require_room(&state, &code).await.unwrap();
        assert!(room.participants.get(member.as_str()).unwrap().has_skipped());

        // Leaving the skip re-opens voting.
        unskip_round(&state, &code, &member).await.unwrap();
        cast_vote(&state, &code, &member, VoteRequest { value: "5".into() })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn skip_then_unskip_round_trips() {
        let state = fast_state();
        let (code, _host, member) = room_with_two(&state).await;

        skip_round(&state, &code, &member).await.unwrap();
        let room = room_service::require_room(&state, &code).await.unwrap();
        assert!(room.participants.get(member.as_str()).unwrap().has_skipped());

        unskip_round(&state, &code, &member).await.unwrap();
        let room = room_service::require_room(&state, &code).await.unwrap();
        assert_eq!(room.participants.get(member.as_str()).unwrap().vote, None);

        // Unskipping twice is a state error.
        let err = unskip_round(&state, &code, &member).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn reveal_requires_the_host_and_fires_once() {
        let state = fast_state();
        let (code, host, member) = room_with_two(&state).await;
        cast_vote(&state, &code, &member, VoteRequest { value: "8".into() })
            .await
            .unwrap();

        let err = start_reveal(&state, &code, &member).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));

        start_reveal(&state, &code, &host).await.unwrap();
        // Zero-second countdown in tests; give the timer task a tick.
        tokio::time::sleep(Duration::from_millis(50)).await;

        let room = room_service::require_room(&state, &code).await.unwrap();
        assert!(room.revealed);
        assert_eq!(room.countdown, None);

        let err = start_reveal(&state, &code, &host).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn cancelling_the_countdown_prevents_the_reveal() {
        let state = AppState::new(AppConfig {
            countdown_secs: 1,
            ..AppConfig::default()
        });
        let (code, host, member) = room_with_two(&state).await;
        cast_vote(&state, &code, &member, VoteRequest { value: "8".into() })
            .await
            .unwrap();

        start_reveal(&state, &code, &host).await.unwrap();

        // Votes are locked while the countdown runs.
        let err = cast_vote(&state, &code, &member, VoteRequest { value: "3".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        cancel_reveal(&state, &code, &host).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1200)).await;

        let room = room_service::require_room(&state, &code).await.unwrap();
        assert!(!room.revealed);
        assert_eq!(room.countdown, None);
    }

    #[tokio::test]
    async fn reset_clears_votes_and_leaves_a_notification() {
        let state = fast_state();
        let (code, host, member) = room_with_two(&state).await;
        cast_vote(&state, &code, &member, VoteRequest { value: "13".into() })
            .await
            .unwrap();
        start_reveal(&state, &code, &host).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = reset_round(&state, &code, &host, ResetRequest { confirm: false })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        reset_round(&state, &code, &host, ResetRequest { confirm: true })
            .await
            .unwrap();

        let room = room_service::require_room(&state, &code).await.unwrap();
        assert!(!room.revealed);
        assert!(room.participants.values().all(|p| p.vote.is_none()));
        assert_eq!(room.reset_state, None);
        let notification = room.reset_notification.unwrap();
        assert!(!notification.notified);
        assert!(notification.timestamp > 0);
    }
}
