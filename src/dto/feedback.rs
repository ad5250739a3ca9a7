//! User feedback payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Payload submitted through the feedback form.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct FeedbackRequest {
    /// Free-form feedback text.
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    /// Optional category chosen by the user (bug, idea, other).
    #[serde(default)]
    #[validate(length(max = 50))]
    pub category: Option<String>,
    /// Optional reply address.
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    /// Room the feedback was sent from, when any.
    #[serde(default)]
    pub room_code: Option<String>,
}

/// Acknowledgement returned after feedback was stored.
#[derive(Debug, Serialize, ToSchema)]
pub struct FeedbackResponse {
    /// Always "received".
    pub status: String,
}

impl FeedbackResponse {
    /// Standard acknowledgement.
    pub fn received() -> Self {
        Self {
            status: "received".to_string(),
        }
    }
}
