/// In-process room store backend.
pub mod memory;

use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::dao::{
    models::{
        CountdownEntity, KickedEntity, ParticipantEntity, ResetNotificationEntity,
        ResetStateEntity, RoomEntity, RoomStatus,
    },
    storage::StorageResult,
};

/// Receiver half of a room subscription.
///
/// Carries the full current subtree on every change and `None` once the room node
/// has been removed.
pub type RoomWatch = watch::Receiver<Option<RoomEntity>>;

/// Abstraction over the real-time room tree.
///
/// Required semantics are deliberately weak: last-write-wins per field, every
/// mutation republishes the whole subtree to subscribers, and a client observes
/// its own writes without delay. Nothing stronger is assumed anywhere above this
/// trait, so any real-time-capable key-value store can back it.
pub trait RoomStore: Send + Sync {
    /// True when the room exists and is not in the `deleting` phase.
    fn exists(&self, code: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Fetch the full room subtree, `None` when absent.
    fn get(&self, code: &str) -> BoxFuture<'static, StorageResult<Option<RoomEntity>>>;
    /// Snapshot every stored room, used by the idle sweep.
    fn list(&self) -> BoxFuture<'static, StorageResult<Vec<RoomEntity>>>;
    /// Subscribe to the room subtree; valid even before the room exists.
    fn subscribe(&self, code: &str) -> BoxFuture<'static, StorageResult<RoomWatch>>;
    /// Create or replace an entire room node.
    fn put_room(&self, room: RoomEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Insert or replace a participant node.
    fn add_participant(
        &self,
        code: &str,
        participant_id: &str,
        participant: ParticipantEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove a participant node. Removing an absent participant is a no-op.
    fn remove_participant(
        &self,
        code: &str,
        participant_id: &str,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Write a participant's vote field.
    fn set_vote(
        &self,
        code: &str,
        participant_id: &str,
        vote: Option<String>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Write the room-wide revealed flag.
    fn set_revealed(&self, code: &str, revealed: bool) -> BoxFuture<'static, StorageResult<()>>;
    /// Set or clear the shared reveal countdown.
    fn set_countdown(
        &self,
        code: &str,
        countdown: Option<CountdownEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Set or clear the reset-in-progress marker.
    fn set_reset_state(
        &self,
        code: &str,
        reset_state: Option<ResetStateEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Set or clear the reset notification.
    fn set_reset_notification(
        &self,
        code: &str,
        notification: Option<ResetNotificationEntity>,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Overwrite the shared story text.
    fn set_story(&self, code: &str, story: String) -> BoxFuture<'static, StorageResult<()>>;
    /// Write the advisory kick marker on a participant.
    fn mark_kicked(
        &self,
        code: &str,
        participant_id: &str,
        kicked: KickedEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Write the room lifecycle status.
    fn set_status(&self, code: &str, status: RoomStatus) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove the whole room node, publishing `None` to subscribers.
    fn remove_room(&self, code: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Bump the room's last-active timestamp.
    fn touch(&self, code: &str, now: i64) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap backend liveness probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
