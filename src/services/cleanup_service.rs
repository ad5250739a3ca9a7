//! Background sweep removing rooms nobody touched for hours.

use std::time::Instant;

use tracing::{info, warn};

use crate::{
    dao::models::RoomEntity,
    state::{SharedState, epoch_ms},
};

/// Run the idle sweep forever, once per cooldown interval.
pub async fn run_sweeper(state: SharedState) {
    let mut ticker = tokio::time::interval(state.config().sweep_cooldown);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        if let Err(err) = sweep_if_due(&state).await {
            warn!(error = %err, "idle room sweep failed");
        }
    }
}

/// Sweep idle rooms unless a sweep already ran within the cooldown window.
///
/// Returns how many rooms were removed.
pub async fn sweep_if_due(state: &SharedState) -> Result<usize, crate::error::ServiceError> {
    {
        let mut last = state.last_sweep().lock().await;
        let due = last
            .map(|at| at.elapsed() >= state.config().sweep_cooldown)
            .unwrap_or(true);
        if !due {
            return Ok(0);
        }
        *last = Some(Instant::now());
    }

    let store = state.room_store();
    let now = epoch_ms();
    let threshold_ms = state.config().idle_threshold.as_millis() as i64;

    let mut removed = 0;
    for room in store.list().await? {
        if !is_stale(&room, now, threshold_ms) {
            continue;
        }
        let code = room.room_code.clone();
        match store.remove_room(&code).await {
            Ok(()) => {
                state.sessions().clear_room(&code);
                removed += 1;
                info!(room = %code, "removed idle room");
            }
            Err(err) => warn!(room = %code, error = %err, "failed to remove idle room"),
        }
    }
    if removed > 0 {
        info!(removed, "idle room sweep finished");
    }
    Ok(removed)
}

/// A room is stale when untouched past the threshold, empty, or carrying a
/// timestamp from the future (clock damage; unreachable by normal writes).
fn is_stale(room: &RoomEntity, now: i64, threshold_ms: i64) -> bool {
    room.participants.is_empty()
        || room.created_at > now
        || now - room.last_active > threshold_ms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::models::{ParticipantEntity, RoomStatus},
        state::AppState,
    };
    use std::time::Duration;

    fn room(code: &str, created_at: i64, last_active: i64) -> RoomEntity {
        let mut room = RoomEntity::new(
            code.into(),
            "host".into(),
            ParticipantEntity::new("Hope", true, true, created_at),
            created_at,
        );
        room.last_active = last_active;
        room.status = RoomStatus::Active;
        room
    }

    #[test]
    fn staleness_covers_idle_future_and_empty_rooms() {
        let threshold = 4 * 60 * 60 * 1000;
        let now = 10 * 60 * 60 * 1000;

        assert!(is_stale(&room("OLDROM", 0, 0), now, threshold));
        assert!(!is_stale(&room("FRESH0", 0, now - 1000), now, threshold));
        assert!(is_stale(&room("FUTURE", now + 60_000, now + 60_000), now, threshold));

        let mut empty = room("EMPTY0", 0, now);
        empty.participants.clear();
        assert!(is_stale(&empty, now, threshold));
    }

    #[tokio::test]
    async fn sweep_removes_idle_rooms_and_honours_cooldown() {
        let state = AppState::new(AppConfig {
            idle_threshold: Duration::from_secs(4 * 60 * 60),
            sweep_cooldown: Duration::from_secs(4 * 60 * 60),
            ..AppConfig::default()
        });
        let store = state.room_store();
        let now = epoch_ms();

        store.put_room(room("IDLE00", 0, 0)).await.unwrap();
        store.put_room(room("LIVE00", now, now)).await.unwrap();

        assert_eq!(sweep_if_due(&state).await.unwrap(), 1);
        assert!(store.get("IDLE00").await.unwrap().is_none());
        assert!(store.get("LIVE00").await.unwrap().is_some());

        // Second sweep inside the cooldown window is a no-op.
        store.put_room(room("IDLE01", 0, 0)).await.unwrap();
        assert_eq!(sweep_if_due(&state).await.unwrap(), 0);
        assert!(store.get("IDLE01").await.unwrap().is_some());
    }
}
