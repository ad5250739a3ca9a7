//! Request and response payloads for the HTTP surface.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod feedback;
pub mod health;
pub mod rooms;
pub mod sse;
pub mod validation;
pub mod voting;

/// Render an epoch-milliseconds timestamp as RFC 3339 for outbound documents.
pub(crate) fn format_epoch_ms(ms: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}
