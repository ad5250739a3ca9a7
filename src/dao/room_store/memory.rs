//! In-process [`RoomStore`] backed by a concurrent map and per-room watch channels.
//!
//! This is the default backend: rooms are ephemeral (hours, not days) and the
//! sweep deletes idle ones, so durable persistence buys nothing. The watch
//! channel gives subscribers exactly the contract the trait asks for: the full
//! subtree on every change, `None` after removal.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::dao::{
    models::{
        CountdownEntity, KickedEntity, ParticipantEntity, ResetNotificationEntity,
        ResetStateEntity, RoomEntity, RoomStatus,
    },
    room_store::{RoomStore, RoomWatch},
    storage::{StorageError, StorageResult},
};

/// Shared in-memory room tree.
#[derive(Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    rooms: DashMap<String, RoomEntity>,
    channels: DashMap<String, watch::Sender<Option<RoomEntity>>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn publish(&self, code: &str, snapshot: Option<RoomEntity>) {
        if let Some(sender) = self.inner.channels.get(code) {
            // send_replace updates the value even with no receivers attached.
            sender.send_replace(snapshot);
        }
    }

    /// Apply `mutate` to the room under its map shard lock, then republish.
    fn update<F>(&self, code: &str, mutate: F) -> StorageResult<()>
    where
        F: FnOnce(&mut RoomEntity),
    {
        let snapshot = {
            let Some(mut entry) = self.inner.rooms.get_mut(code) else {
                return Err(StorageError::not_found(code));
            };
            mutate(entry.value_mut());
            entry.value().clone()
        };
        self.publish(code, Some(snapshot));
        Ok(())
    }
}

impl RoomStore for MemoryRoomStore {
    fn exists(&self, code: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move {
            Ok(this
                .inner
                .rooms
                .get(&code)
                .is_some_and(|room| room.status != RoomStatus::Deleting))
        })
    }

    fn get(&self, code: &str) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move { Ok(this.inner.rooms.get(&code).map(|room| room.clone())) })
    }

    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<RoomEntity>>> {
        let this = self.clone();
        Box::pin(async move {
            Ok(this
                .inner
                .rooms
                .iter()
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn subscribe(&self, code: &str) -> BoxFuture<'static, StorageResult<RoomWatch>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move {
            let current = this.inner.rooms.get(&code).map(|room| room.clone());
            let sender = this
                .inner
                .channels
                .entry(code)
                .or_insert_with(|| watch::channel(None).0);
            // Late subscribers must start from the live tree, not the channel's
            // last published value.
            sender.send_replace(current);
            Ok(sender.subscribe())
        })
    }

    fn put_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        Box::pin(async move {
            let code = room.room_code.clone();
            this.inner.rooms.insert(code.clone(), room.clone());
            this.publish(&code, Some(room));
            Ok(())
        })
    }

    fn add_participant(
        &self,
        code: &str,
        participant_id: &str,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        let participant_id = participant_id.to_owned();
        Box::pin(async move {
            this.update(&code, |room| {
                room.participants.insert(participant_id, participant);
            })
        })
    }

    fn remove_participant(
        &self,
        code: &str,
        participant_id: &str,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        let participant_id = participant_id.to_owned();
        Box::pin(async move {
            this.update(&code, |room| {
                room.participants.shift_remove(&participant_id);
            })
        })
    }

    fn set_vote(
        &self,
        code: &str,
        participant_id: &str,
        vote: Option<String>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        let participant_id = participant_id.to_owned();
        Box::pin(async move {
            this.update(&code, |room| {
                if let Some(participant) = room.participants.get_mut(&participant_id) {
                    participant.vote = vote;
                }
            })
        })
    }

    fn set_revealed(&self, code: &str, revealed: bool) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move { this.update(&code, |room| room.revealed = revealed) })
    }

    fn set_countdown(
        &self,
        code: &str,
        countdown: Option<CountdownEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move { this.update(&code, |room| room.countdown = countdown) })
    }

    fn set_reset_state(
        &self,
        code: &str,
        reset_state: Option<ResetStateEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move { this.update(&code, |room| room.reset_state = reset_state) })
    }

    fn set_reset_notification(
        &self,
        code: &str,
        notification: Option<ResetNotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move { this.update(&code, |room| room.reset_notification = notification) })
    }

    fn set_story(&self, code: &str, story: String) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move { this.update(&code, |room| room.story = story) })
    }

    fn mark_kicked(
        &self,
        code: &str,
        participant_id: &str,
        kicked: KickedEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        let participant_id = participant_id.to_owned();
        Box::pin(async move {
            this.update(&code, |room| {
                if let Some(participant) = room.participants.get_mut(&participant_id) {
                    participant.kicked = Some(kicked);
                }
            })
        })
    }

    fn set_status(&self, code: &str, status: RoomStatus) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move { this.update(&code, |room| room.status = status) })
    }

    fn remove_room(&self, code: &str) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move {
            this.inner.rooms.remove(&code);
            this.publish(&code, None);
            // Keep the channel only while someone is listening; the next
            // subscribe recreates it on demand.
            this.inner
                .channels
                .remove_if(&code, |_, sender| sender.receiver_count() == 0);
            Ok(())
        })
    }

    fn touch(&self, code: &str, now: i64) -> BoxFuture<'static, StorageResult<()>> {
        let this = self.clone();
        let code = code.to_owned();
        Box::pin(async move { this.update(&code, |room| room.last_active = now) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(code: &str) -> RoomEntity {
        RoomEntity::new(
            code.into(),
            "host".into(),
            ParticipantEntity::new("Host", true, true, 1),
            1,
        )
    }

    #[tokio::test]
    async fn subscription_sees_every_mutation_and_final_removal() {
        let store = MemoryRoomStore::new();
        store.put_room(room("AAAAAA")).await.unwrap();

        let mut watch = store.subscribe("AAAAAA").await.unwrap();
        assert!(watch.borrow_and_update().is_some());

        store
            .set_vote("AAAAAA", "host", Some("5".into()))
            .await
            .unwrap();
        watch.changed().await.unwrap();
        let vote = watch
            .borrow_and_update()
            .as_ref()
            .and_then(|r| r.participants["host"].vote.clone());
        assert_eq!(vote.as_deref(), Some("5"));

        store.remove_room("AAAAAA").await.unwrap();
        watch.changed().await.unwrap();
        assert!(watch.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn deleting_status_hides_room_from_exists() {
        let store = MemoryRoomStore::new();
        store.put_room(room("BBBBBB")).await.unwrap();
        assert!(store.exists("BBBBBB").await.unwrap());

        store
            .set_status("BBBBBB", RoomStatus::Deleting)
            .await
            .unwrap();
        assert!(!store.exists("BBBBBB").await.unwrap());
        // The node itself is still readable during the grace window.
        assert!(store.get("BBBBBB").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn mutating_a_missing_room_reports_not_found() {
        let store = MemoryRoomStore::new();
        let err = store.set_revealed("NOPE42", true).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn subscribe_before_creation_starts_empty_then_fills() {
        let store = MemoryRoomStore::new();
        let mut watch = store.subscribe("CCCCCC").await.unwrap();
        assert!(watch.borrow_and_update().is_none());

        store.put_room(room("CCCCCC")).await.unwrap();
        watch.changed().await.unwrap();
        assert!(watch.borrow_and_update().is_some());
    }
}
