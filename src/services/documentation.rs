use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Planning Poker Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::rooms::create_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::room_exists,
        crate::routes::rooms::join_room,
        crate::routes::rooms::leave_room,
        crate::routes::rooms::update_story,
        crate::routes::rooms::delete_room,
        crate::routes::rooms::kick_participant,
        crate::routes::voting::cast_vote,
        crate::routes::voting::skip_round,
        crate::routes::voting::unskip_round,
        crate::routes::voting::start_reveal,
        crate::routes::voting::cancel_reveal,
        crate::routes::voting::reset_round,
        crate::routes::events::room_events,
        crate::routes::feedback::submit_feedback,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::rooms::CreateRoomRequest,
            crate::dto::rooms::JoinRoomRequest,
            crate::dto::rooms::StoryRequest,
            crate::dto::rooms::RoomCreatedResponse,
            crate::dto::rooms::JoinedResponse,
            crate::dto::rooms::RoomExistsResponse,
            crate::dto::rooms::RoomSnapshot,
            crate::dto::rooms::ParticipantSummary,
            crate::dto::voting::VoteRequest,
            crate::dto::voting::ResetRequest,
            crate::dto::voting::CountdownStartedResponse,
            crate::dto::feedback::FeedbackRequest,
            crate::dto::feedback::FeedbackResponse,
            crate::dto::sse::AwaitingNamePayload,
            crate::dto::sse::NoticePayload,
            crate::dto::sse::RedirectPayload,
            crate::dao::models::RoomStatus,
            crate::dao::models::CountdownEntity,
            crate::state::stats::VoteStatistics,
            crate::state::stats::DistributionEntry,
            crate::state::stats::VoteCount,
            crate::state::room::Role,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "rooms", description = "Room lifecycle operations"),
        (name = "voting", description = "Voting round operations"),
        (name = "events", description = "Per-room server-sent event streams"),
        (name = "feedback", description = "User feedback intake"),
    )
)]
pub struct ApiDoc;
