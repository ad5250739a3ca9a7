//! HTTP route trees.

use axum::{Router, http::HeaderMap};

use crate::{error::AppError, state::SharedState};

pub mod docs;
pub mod events;
pub mod feedback;
pub mod health;
pub mod rooms;
pub mod voting;

/// Header carrying the caller's session token on mutating routes.
pub const SESSION_HEADER: &str = "x-session-id";

/// Extract the session token from the request headers.
pub(crate) fn require_session(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized(format!("missing {SESSION_HEADER} header")))
}

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(rooms::router())
        .merge(voting::router())
        .merge(events::router())
        .merge(feedback::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
