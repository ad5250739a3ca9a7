//! Room lifecycle routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
};
use validator::Validate;

use crate::{
    dto::rooms::{
        CreateRoomRequest, JoinRoomRequest, JoinedResponse, RoomCodeParam, RoomCreatedResponse,
        RoomExistsResponse, RoomSnapshot, StoryRequest,
    },
    dto::validation::validate_room_code,
    error::AppError,
    routes::require_session,
    services::room_service,
    state::SharedState,
};

/// Routes handling room lifecycle operations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{code}", get(get_room).delete(delete_room))
        .route("/rooms/{code}/exists", get(room_exists))
        .route("/rooms/{code}/join", post(join_room))
        .route("/rooms/{code}/leave", post(leave_room))
        .route("/rooms/{code}/story", put(update_story))
        .route(
            "/rooms/{code}/participants/{participant_id}",
            delete(kick_participant),
        )
}

/// Create a room with the caller as host.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 200, description = "Room created", body = RoomCreatedResponse)
    )
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoomRequest>,
) -> Result<Json<RoomCreatedResponse>, AppError> {
    payload.validate()?;
    let created = room_service::create_room(&state, payload).await?;
    Ok(Json(created))
}

/// Fetch a one-off room snapshot tailored to the caller.
#[utoipa::path(
    get,
    path = "/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Current room state", body = RoomSnapshot),
        (status = 404, description = "Room does not exist")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
) -> Result<Json<RoomSnapshot>, AppError> {
    params.validate()?;
    let viewer = require_session(&headers).ok();
    let viewer = viewer.filter(|id| {
        state
            .sessions()
            .get_for_room(id, &params.code)
            .is_some()
    });
    let room = room_service::require_room(&state, &params.code).await?;
    Ok(Json(RoomSnapshot::for_viewer(
        &room,
        viewer.as_deref(),
        &state.config().deck,
    )))
}

/// Probe whether a room exists, used by the join form.
#[utoipa::path(
    get,
    path = "/rooms/{code}/exists",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Existence flag", body = RoomExistsResponse)
    )
)]
pub async fn room_exists(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Json<RoomExistsResponse>, AppError> {
    // A malformed code cannot name a room; answer rather than error so the
    // join form gets one uniform response shape.
    let exists = validate_room_code(&code).is_ok()
        && room_service::room_exists(&state, &code).await?;
    Ok(Json(RoomExistsResponse { exists }))
}

/// Join an existing room.
#[utoipa::path(
    post,
    path = "/rooms/{code}/join",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined", body = JoinedResponse),
        (status = 404, description = "Room does not exist")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<JoinedResponse>, AppError> {
    params.validate()?;
    payload.validate()?;
    let joined = room_service::join_room(&state, &params.code, payload).await?;
    Ok(Json(joined))
}

/// Leave a room voluntarily.
#[utoipa::path(
    post,
    path = "/rooms/{code}/leave",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 204, description = "Left the room"),
        (status = 401, description = "Missing or unknown session")
    )
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    room_service::leave_room(&state, &params.code, &session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Update the shared story text. Host only.
#[utoipa::path(
    put,
    path = "/rooms/{code}/story",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    request_body = StoryRequest,
    responses(
        (status = 204, description = "Story updated"),
        (status = 401, description = "Caller is not the host")
    )
)]
pub async fn update_story(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
    Json(payload): Json<StoryRequest>,
) -> Result<StatusCode, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    room_service::update_story(&state, &params.code, &session_id, payload.story).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a room. Host only; removal happens after a short grace period.
#[utoipa::path(
    delete,
    path = "/rooms/{code}",
    tag = "rooms",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 204, description = "Room deleted"),
        (status = 401, description = "Caller is not the host")
    )
)]
pub async fn delete_room(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    room_service::delete_room(&state, &params.code, &session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Remove a participant from the room. Host only.
#[utoipa::path(
    delete,
    path = "/rooms/{code}/participants/{participant_id}",
    tag = "rooms",
    params(
        ("code" = String, Path, description = "Room code"),
        ("participant_id" = String, Path, description = "Participant to remove")
    ),
    responses(
        (status = 204, description = "Participant removed"),
        (status = 401, description = "Caller is not the host"),
        (status = 404, description = "Participant not found")
    )
)]
pub async fn kick_participant(
    State(state): State<SharedState>,
    Path((code, participant_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    validate_room_code(&code).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let session_id = require_session(&headers)?;
    room_service::kick_participant(&state, &code, &session_id, &participant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
