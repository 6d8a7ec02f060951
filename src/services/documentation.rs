use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for QuizLive Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::quiz::list_quizzes,
        crate::routes::quiz::create_session,
        crate::routes::quiz::list_sessions,
        crate::routes::session::get_session,
        crate::routes::session::update_session_action,
        crate::routes::session::join_session,
        crate::routes::sse::session_stream,
        crate::routes::player::get_player_status,
        crate::routes::player::get_current_question_info,
        crate::routes::player::submit_answer,
        crate::routes::player::get_question_results,
        crate::routes::player::get_final_results,
        crate::routes::chat::post_message,
        crate::routes::chat::get_messages,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::quiz::QuizSummary,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::SessionCreated,
            crate::dto::session::SessionActionRequest,
            crate::dto::session::SessionStatus,
            crate::dto::session::SessionList,
            crate::dto::player::JoinSessionRequest,
            crate::dto::player::PlayerJoined,
            crate::dto::player::PlayerStatus,
            crate::dto::player::QuestionInfo,
            crate::dto::player::AnswerChoice,
            crate::dto::player::SubmitAnswerRequest,
            crate::dto::results::QuestionResultResponse,
            crate::dto::results::ResultEntryDto,
            crate::dto::results::FinalResults,
            crate::dto::results::RankingEntry,
            crate::dto::chat::PostMessageRequest,
            crate::dto::chat::ChatMessageDto,
            crate::dto::sse::Handshake,
            crate::dto::sse::PhaseChangedEvent,
            crate::dto::sse::PlayerJoinedEvent,
            crate::state::state_machine::SessionAction,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "quiz", description = "Quizzes and session creation"),
        (name = "session", description = "Session state and host actions"),
        (name = "player", description = "Player-scoped questions, answers and results"),
        (name = "chat", description = "Session chat"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
