//! API Models
//!
//! Request payloads and response views for the REST surface, annotated for
//! OpenAPI generation with `utoipa`. The views are projections of the core
//! `SessionState`; core types cross the boundary as plain JSON objects.

use chrono::{DateTime, Utc};
use pathways_core::plan::{ChatTurn, Prerequisite, ProficiencyLevel, ResourceSet, Roadmap};
use pathways_core::session::{ParseWarning, Stage};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::{SessionEntry, SessionSummary};

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionPayload {
    #[schema(example = "Linear Algebra")]
    pub topic: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangeTopicPayload {
    #[schema(example = "Graph Theory")]
    pub topic: String,
}

/// Proficiency ratings keyed by prerequisite name. Partial submissions are
/// accepted; subtopic generation waits until every prerequisite is rated.
#[derive(Deserialize, ToSchema)]
pub struct ProficiencyPayload {
    #[schema(value_type = Object, example = json!({"Arithmetic": "Beginner"}))]
    pub ratings: HashMap<String, ProficiencyLevel>,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectionPayload {
    #[schema(example = json!(["Vectors"]))]
    pub subtopics: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatPayload {
    #[schema(example = "What is a vector?")]
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

/// A session line item for the index endpoint.
#[derive(Serialize, ToSchema)]
pub struct SessionSummaryView {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub topic: String,
    pub created_at: DateTime<Utc>,
}

impl From<SessionSummary> for SessionSummaryView {
    fn from(summary: SessionSummary) -> Self {
        Self {
            id: summary.id,
            topic: summary.topic,
            created_at: summary.created_at,
        }
    }
}

/// The full projection of one session: current stage, everything generated
/// so far, and any parse-failure warnings. Absent values are stages that
/// have not run yet.
#[derive(Serialize, ToSchema)]
pub struct SessionView {
    #[schema(value_type = String, format = Uuid)]
    pub id: Uuid,
    pub topic: String,
    #[schema(value_type = String, example = "prerequisites_assessment")]
    pub stage: Stage,
    #[schema(value_type = Option<Vec<Object>>)]
    pub prerequisites: Option<Vec<Prerequisite>>,
    #[schema(value_type = Object)]
    pub proficiency: BTreeMap<String, ProficiencyLevel>,
    pub subtopics: Option<Vec<String>>,
    pub selected_subtopics: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub roadmap: Option<Roadmap>,
    #[schema(value_type = Option<Object>)]
    pub resources: Option<ResourceSet>,
    pub content: Option<String>,
    #[schema(value_type = Vec<Object>)]
    pub transcript: Vec<ChatTurn>,
    #[schema(value_type = Vec<Object>)]
    pub warnings: Vec<ParseWarning>,
    pub created_at: DateTime<Utc>,
}

impl SessionView {
    pub fn from_entry(entry: &SessionEntry) -> Self {
        let state = &entry.state;
        Self {
            id: entry.id,
            topic: state.topic().to_string(),
            stage: state.stage(),
            prerequisites: state.prerequisites().map(<[Prerequisite]>::to_vec),
            proficiency: state.proficiency().clone(),
            subtopics: state.subtopics().map(<[String]>::to_vec),
            selected_subtopics: state.selected_subtopics().to_vec(),
            roadmap: state.roadmap().cloned(),
            resources: state.resources().cloned(),
            content: state.content().map(str::to_string),
            transcript: state.transcript().to_vec(),
            warnings: state.warnings().to_vec(),
            created_at: entry.created_at,
        }
    }
}
