/// Write-only sinks for feedback and outbound email documents.
pub mod feedback;
/// Storage entity definitions mirroring the room subtree shape.
pub mod models;
/// Room persistence and real-time subscription layer.
pub mod room_store;
/// Storage abstraction errors shared by all backends.
pub mod storage;
