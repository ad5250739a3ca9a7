//! Shared application state and the domain logic that operates on it.

pub mod identity;
pub mod room;
pub mod session;
pub mod stats;

use std::{
    sync::Arc,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use tokio::sync::Mutex;

use crate::{
    config::AppConfig,
    dao::{
        feedback::{FeedbackSink, MemoryFeedbackSink},
        room_store::{RoomStore, memory::MemoryRoomStore},
    },
    state::identity::SessionStore,
};

/// Cheap-to-clone handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state shared by every handler and background task.
pub struct AppState {
    config: AppConfig,
    room_store: Arc<dyn RoomStore>,
    feedback: Arc<dyn FeedbackSink>,
    sessions: SessionStore,
    /// Completion time of the last idle-room sweep, used for cooldown.
    last_sweep: Mutex<Option<Instant>>,
}

impl AppState {
    /// Construct the state with in-memory backends, wrapped in an [`Arc`] so it
    /// can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_backends(
            config,
            Arc::new(MemoryRoomStore::default()),
            Arc::new(MemoryFeedbackSink::default()),
        )
    }

    /// Construct the state around explicit backends.
    pub fn with_backends(
        config: AppConfig,
        room_store: Arc<dyn RoomStore>,
        feedback: Arc<dyn FeedbackSink>,
    ) -> SharedState {
        Arc::new(Self {
            config,
            room_store,
            feedback,
            sessions: SessionStore::default(),
            last_sweep: Mutex::new(None),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the room store.
    pub fn room_store(&self) -> Arc<dyn RoomStore> {
        Arc::clone(&self.room_store)
    }

    /// Handle to the feedback sink.
    pub fn feedback(&self) -> Arc<dyn FeedbackSink> {
        Arc::clone(&self.feedback)
    }

    /// Registry of issued session identities.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Completion time of the last idle-room sweep.
    pub fn last_sweep(&self) -> &Mutex<Option<Instant>> {
        &self.last_sweep
    }
}

/// Current wall-clock time as epoch milliseconds, the timestamp unit used
/// throughout the room tree.
pub fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
