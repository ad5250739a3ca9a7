//! Voting round routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{post, put},
};
use validator::Validate;

use crate::{
    dto::rooms::RoomCodeParam,
    dto::voting::{CountdownStartedResponse, ResetRequest, VoteRequest},
    error::AppError,
    routes::require_session,
    services::voting_service,
    state::SharedState,
};

/// Routes handling votes, reveal, and reset.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{code}/vote", put(cast_vote))
        .route("/rooms/{code}/skip", post(skip_round).delete(unskip_round))
        .route(
            "/rooms/{code}/reveal",
            post(start_reveal).delete(cancel_reveal),
        )
        .route("/rooms/{code}/reset", post(reset_round))
}

/// Cast or change a vote for the current round.
#[utoipa::path(
    put,
    path = "/rooms/{code}/vote",
    tag = "voting",
    params(("code" = String, Path, description = "Room code")),
    request_body = VoteRequest,
    responses(
        (status = 204, description = "Vote recorded"),
        (status = 400, description = "Value is not in the deck"),
        (status = 409, description = "Round does not accept votes right now")
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
    Json(payload): Json<VoteRequest>,
) -> Result<StatusCode, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    voting_service::cast_vote(&state, &params.code, &session_id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sit the current round out.
#[utoipa::path(
    post,
    path = "/rooms/{code}/skip",
    tag = "voting",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 204, description = "Round skipped"),
        (status = 401, description = "Facilitators do not take part in rounds")
    )
)]
pub async fn skip_round(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    voting_service::skip_round(&state, &params.code, &session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Rejoin the round after skipping it.
#[utoipa::path(
    delete,
    path = "/rooms/{code}/skip",
    tag = "voting",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 204, description = "Skip cleared"),
        (status = 409, description = "Caller was not skipping")
    )
)]
pub async fn unskip_round(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    voting_service::unskip_round(&state, &params.code, &session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Start the shared reveal countdown. Host only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/reveal",
    tag = "voting",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Countdown started", body = CountdownStartedResponse),
        (status = 401, description = "Caller is not the host"),
        (status = 409, description = "Already revealed or counting down")
    )
)]
pub async fn start_reveal(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
) -> Result<Json<CountdownStartedResponse>, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    let started = voting_service::start_reveal(&state, &params.code, &session_id).await?;
    Ok(Json(started))
}

/// Cancel a running reveal countdown. Host only.
#[utoipa::path(
    delete,
    path = "/rooms/{code}/reveal",
    tag = "voting",
    params(("code" = String, Path, description = "Room code")),
    responses(
        (status = 204, description = "Countdown cancelled"),
        (status = 409, description = "No countdown running")
    )
)]
pub async fn cancel_reveal(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    voting_service::cancel_reveal(&state, &params.code, &session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Clear all votes and start a fresh round. Host only.
#[utoipa::path(
    post,
    path = "/rooms/{code}/reset",
    tag = "voting",
    params(("code" = String, Path, description = "Room code")),
    request_body = ResetRequest,
    responses(
        (status = 204, description = "Round reset"),
        (status = 400, description = "Missing confirmation"),
        (status = 401, description = "Caller is not the host")
    )
)]
pub async fn reset_round(
    State(state): State<SharedState>,
    Path(params): Path<RoomCodeParam>,
    headers: HeaderMap,
    Json(payload): Json<ResetRequest>,
) -> Result<StatusCode, AppError> {
    params.validate()?;
    let session_id = require_session(&headers)?;
    voting_service::reset_round(&state, &params.code, &session_id, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
