//! Axum Handlers for the REST API
//!
//! Each handler is one explicit user action against the session stage
//! machine. Guard violations come back as 409, bad input as 400, collaborator
//! failures as 502 with the data left absent so the action can simply be
//! retried. Parse failures never produce an error status; they ride along as
//! warnings in the session view.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use pathways_core::orchestrator::OrchestratorError;
use pathways_core::session::{SessionError, SessionState};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    models::{
        ChangeTopicPayload, ChatPayload, ChatReply, CreateSessionPayload, ErrorResponse,
        ProficiencyPayload, SelectionPayload, SessionSummaryView, SessionView,
    },
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    UpstreamFailure(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::Conflict(message) => {
                (StatusCode::CONFLICT, Json(ErrorResponse { message })).into_response()
            }
            ApiError::UpstreamFailure(message) => {
                warn!("Upstream LLM failure: {}", message);
                let message = format!("{message}; the action can be retried");
                (StatusCode::BAD_GATEWAY, Json(ErrorResponse { message })).into_response()
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::EmptyTopic
            | SessionError::UnknownPrerequisite(_)
            | SessionError::UnknownSubtopic(_)
            | SessionError::EmptySelection => ApiError::BadRequest(err.to_string()),
            SessionError::AssessmentIncomplete | SessionError::WrongStage(_) => {
                ApiError::Conflict(err.to_string())
            }
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::Precondition(inner) => inner.into(),
            OrchestratorError::Invocation(inner) => ApiError::UpstreamFailure(inner.to_string()),
        }
    }
}

/// Start a session: submit a topic and generate its prerequisites.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionPayload,
    responses(
        (status = 201, description = "Session created with prerequisites generated", body = SessionView),
        (status = 400, description = "Empty topic", body = ErrorResponse),
        (status = 502, description = "Generation failed; retry by resubmitting", body = ErrorResponse)
    )
)]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = SessionState::new(&payload.topic)?;

    // Generate before registering: a failed creation leaves nothing behind
    // and the user retries by resubmitting the topic.
    state
        .orchestrator
        .generate_prerequisites(&mut session)
        .await?;

    let (_, entry) = state.store.insert(session).await;
    let view = SessionView::from_entry(&*entry.lock().await);
    Ok((StatusCode::CREATED, Json(view)))
}

/// List all sessions.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "List of sessions", body = [SessionSummaryView])
    )
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionSummaryView>>, ApiError> {
    let summaries = state.store.list().await;
    Ok(Json(summaries.into_iter().map(Into::into).collect()))
}

/// Get the full view of one session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session details", body = SessionView),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Session ID")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let entry = state
        .store
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))?;
    let view = SessionView::from_entry(&*entry.lock().await);
    Ok(Json(view))
}

/// Change the session topic, discarding all downstream data, and regenerate
/// prerequisites.
#[utoipa::path(
    put,
    path = "/sessions/{id}/topic",
    request_body = ChangeTopicPayload,
    responses(
        (status = 200, description = "Topic changed, downstream data discarded", body = SessionView),
        (status = 400, description = "Empty topic", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 502, description = "Generation failed; retry the topic change", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Session ID")
    )
)]
pub async fn change_topic(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeTopicPayload>,
) -> Result<Json<SessionView>, ApiError> {
    let entry = state
        .store
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))?;
    let mut entry = entry.lock().await;

    entry.state.reset_topic(&payload.topic)?;
    state
        .orchestrator
        .generate_prerequisites(&mut entry.state)
        .await?;

    Ok(Json(SessionView::from_entry(&entry)))
}

/// Record proficiency ratings; once every prerequisite is rated, subtopics
/// are generated and the session advances.
#[utoipa::path(
    post,
    path = "/sessions/{id}/proficiency",
    request_body = ProficiencyPayload,
    responses(
        (status = 200, description = "Ratings recorded; subtopics generated when complete", body = SessionView),
        (status = 400, description = "Unknown prerequisite", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Not in the assessment stage", body = ErrorResponse),
        (status = 502, description = "Generation failed; resubmit ratings to retry", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Session ID")
    )
)]
pub async fn submit_proficiency(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProficiencyPayload>,
) -> Result<Json<SessionView>, ApiError> {
    let entry = state
        .store
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))?;
    let mut entry = entry.lock().await;

    for (name, level) in &payload.ratings {
        entry.state.rate_proficiency(name, *level)?;
    }

    if entry.state.proficiency_complete() {
        state
            .orchestrator
            .generate_subtopics(&mut entry.state)
            .await?;
    }

    Ok(Json(SessionView::from_entry(&entry)))
}

/// Record the subtopic selection and generate the roadmap, resources, and
/// content summary.
#[utoipa::path(
    post,
    path = "/sessions/{id}/selection",
    request_body = SelectionPayload,
    responses(
        (status = 200, description = "Selection recorded and plan generated", body = SessionView),
        (status = 400, description = "Empty selection or unknown subtopic", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Not in the selection stage", body = ErrorResponse),
        (status = 502, description = "Generation failed; resubmit to retry the missing pieces", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Session ID")
    )
)]
pub async fn submit_selection(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectionPayload>,
) -> Result<Json<SessionView>, ApiError> {
    let entry = state
        .store
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))?;
    let mut entry = entry.lock().await;

    // Re-selection after the plan stage is a guard violation; repeating the
    // same action with the plan already generated is answered from the
    // memoized data.
    if entry.state.stage() == pathways_core::session::Stage::SubtopicSelection {
        entry.state.select_subtopics(&payload.subtopics)?;
    } else if entry.state.selected_subtopics() != payload.subtopics.as_slice() {
        return Err(SessionError::WrongStage(entry.state.stage()).into());
    }
    state.orchestrator.generate_plan(&mut entry.state).await?;

    Ok(Json(SessionView::from_entry(&entry)))
}

/// Send a chat message. The first message opens the chat stage; afterwards
/// the stage self-loops with no limit on turns.
#[utoipa::path(
    post,
    path = "/sessions/{id}/chat",
    request_body = ChatPayload,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 409, description = "Chat not available before the plan stage", body = ErrorResponse),
        (status = 502, description = "Generation failed; resend the message", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Session ID")
    )
)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatReply>, ApiError> {
    let entry = state
        .store
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))?;
    let mut entry = entry.lock().await;

    let reply = state
        .orchestrator
        .chat(&mut entry.state, &payload.message)
        .await?;

    Ok(Json(ChatReply { reply }))
}

/// End a session, destroying its state.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    params(
        ("id" = String, Path, description = "Session ID")
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.store.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {id} not found")))
    }
}
