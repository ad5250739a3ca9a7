//! Health probe against the room store.

use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a health payload while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store = state.room_store();
    if let Err(err) = store.health_check().await {
        warn!(error = %err, "storage health check failed");
        return HealthResponse::degraded();
    }
    match store.list().await {
        Ok(rooms) => HealthResponse::ok(rooms.len()),
        Err(err) => {
            warn!(error = %err, "storage room listing failed");
            HealthResponse::degraded()
        }
    }
}
