//! Bridges room subscriptions to per-viewer SSE streams.
//!
//! Each connection owns a [`SessionMachine`] fed with every store update; the
//! machine's effects are rendered into SSE events here, with votes masked for
//! the viewer before anything leaves the server.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tracing::{info, warn};

use crate::{
    dto::{rooms::RoomSnapshot, sse::ServerEvent},
    error::ServiceError,
    state::{
        SharedState,
        session::{Observation, SessionEffect, SessionMachine},
    },
};

/// Interval between SSE keep-alive comments.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Open a per-viewer event stream for a room.
///
/// `session_id` is optional: viewers without one get the snapshot stream with
/// every vote masked plus a prompt to join. The stream ends on its own when
/// the machine tears the session down.
pub async fn room_stream(
    state: SharedState,
    code: String,
    session_id: Option<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServiceError> {
    let identity =
        session_id.and_then(|id| state.sessions().get_for_room(&id, &code));
    let viewer = identity.as_ref().map(|i| i.session_id.clone());
    let is_host = identity.as_ref().is_some_and(|i| i.is_host);

    let mut watch = state.room_store().subscribe(&code).await?;
    let mut machine = SessionMachine::new(viewer.clone(), is_host, state.config().session_delays());

    info!(room = %code, identified = viewer.is_some(), "room stream opened");

    let stream = async_stream::stream! {
        loop {
            let snapshot = watch.borrow_and_update().clone();
            let observation = match &snapshot {
                Some(room) => Observation::Snapshot(room),
                None => Observation::Missing,
            };
            let self_deleting = viewer
                .as_deref()
                .is_some_and(|id| state.sessions().is_deleting(&code, id));

            let mut finished = false;
            for effect in machine.observe(observation, self_deleting) {
                let event = match effect {
                    SessionEffect::EmitSnapshot => snapshot.as_ref().map(|room| {
                        ServerEvent::snapshot(&RoomSnapshot::for_viewer(
                            room,
                            viewer.as_deref(),
                            &state.config().deck,
                        ))
                    }),
                    SessionEffect::PromptForName => Some(ServerEvent::awaiting_name()),
                    SessionEffect::Notice(notice) => Some(ServerEvent::notice(notice)),
                    SessionEffect::Redirect { after } => {
                        Some(ServerEvent::redirect(after.as_millis() as u64))
                    }
                    SessionEffect::ClearIdentity => {
                        if let Some(id) = viewer.as_deref() {
                            state.sessions().remove(id);
                        }
                        None
                    }
                    SessionEffect::Unsubscribe => {
                        finished = true;
                        None
                    }
                };
                if let Some(event) = event {
                    match event {
                        Ok(payload) => {
                            yield Ok(Event::default().event(payload.event).data(payload.data));
                        }
                        Err(err) => {
                            warn!(room = %code, error = %err, "failed to serialise stream event");
                        }
                    }
                }
            }
            if finished {
                info!(room = %code, "room stream finished");
                break;
            }

            if watch.changed().await.is_err() {
                // Store dropped the channel; nothing more will arrive.
                break;
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}
