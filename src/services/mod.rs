/// Background removal of idle rooms.
pub mod cleanup_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Feedback intake and notification queueing.
pub mod feedback_service;
/// Health check service.
pub mod health_service;
/// Room lifecycle operations.
pub mod room_service;
/// Voting round operations.
pub mod voting_service;
/// Per-viewer room event streams.
pub mod watch_service;
