//! Per-room SSE stream route.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use serde::Deserialize;
use validator::Validate;

use crate::{
    dto::rooms::RoomCodeParam, error::AppError, services::watch_service, state::SharedState,
};

/// Query parameters for the event stream.
///
/// `EventSource` cannot set request headers, so the session token travels as a
/// query parameter on this route only.
#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    /// Optional session token identifying the viewer.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Routes handling the room event stream.
pub fn router() -> Router<SharedState> {
    Router::new().route("/rooms/{code}/events", get(room_events))
}

/// Stream room updates, notices, and redirects to one viewer.
#[utoipa::path(
    get,
    path = "/rooms/{code}/events",
    tag = "events",
    params(
        ("code" = String, Path, description = "Room code"),
        ("session_id" = Option<String>, Query, description = "Viewer session token")
    ),
    responses((status = 200, description = "Room SSE stream", content_type = "text/event-stream", body = String))
)]
pub async fn room_events(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    Query(query): Query<EventStreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    params.validate()?;
    let stream = watch_service::room_stream(state, params.code, query.session_id).await?;
    Ok(stream)
}
