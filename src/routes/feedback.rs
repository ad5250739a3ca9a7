//! Feedback route.

use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::feedback::{FeedbackRequest, FeedbackResponse},
    error::AppError,
    services::feedback_service,
    state::SharedState,
};

/// Routes handling feedback submission.
pub fn router() -> Router<SharedState> {
    Router::new().route("/feedback", post(submit_feedback))
}

/// Store a feedback submission and queue its notification email.
#[utoipa::path(
    post,
    path = "/feedback",
    tag = "feedback",
    request_body = FeedbackRequest,
    responses(
        (status = 200, description = "Feedback stored", body = FeedbackResponse),
        (status = 400, description = "Invalid payload")
    )
)]
pub async fn submit_feedback(
    State(state): State<SharedState>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    payload.validate()?;
    feedback_service::submit(&state, payload).await?;
    Ok(Json(FeedbackResponse::received()))
}
