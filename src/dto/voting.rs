//! Voting round payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Payload used to cast a vote.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// A card from the configured deck. Validity is checked against the
    /// server-side deck, not a client-supplied list.
    pub value: String,
}

/// Payload guarding the destructive round reset.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetRequest {
    /// Must be true; resets without explicit confirmation are rejected.
    #[serde(default)]
    pub confirm: bool,
}

/// Response returned when a reveal countdown starts.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountdownStartedResponse {
    /// Countdown start, epoch milliseconds.
    pub start_time: i64,
    /// Countdown duration in seconds.
    pub seconds: u64,
}
