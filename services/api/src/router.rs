//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the REST API and OpenAPI documentation.

use crate::{
    handlers,
    models::{
        ChangeTopicPayload, ChatPayload, ChatReply, CreateSessionPayload, ErrorResponse,
        ProficiencyPayload, SelectionPayload, SessionSummaryView, SessionView,
    },
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post, put},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::create_session,
        handlers::list_sessions,
        handlers::get_session,
        handlers::change_topic,
        handlers::submit_proficiency,
        handlers::submit_selection,
        handlers::chat,
        handlers::delete_session,
    ),
    components(
        schemas(
            CreateSessionPayload,
            ChangeTopicPayload,
            ProficiencyPayload,
            SelectionPayload,
            ChatPayload,
            ChatReply,
            SessionView,
            SessionSummaryView,
            ErrorResponse
        )
    ),
    tags(
        (name = "Pathways API", description = "Interactive learning-path sessions")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Group all routes that require AppState into their own router.
    let api_router = Router::new()
        .route(
            "/sessions",
            get(handlers::list_sessions).post(handlers::create_session),
        )
        .route(
            "/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/sessions/{id}/topic", put(handlers::change_topic))
        .route(
            "/sessions/{id}/proficiency",
            post(handlers::submit_proficiency),
        )
        .route("/sessions/{id}/selection", post(handlers::submit_selection))
        .route("/sessions/{id}/chat", post(handlers::chat))
        // Apply the state ONLY to this group of routes.
        .with_state(app_state);

    // Merge the stateful routes with the stateless ones (like Swagger UI).
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
