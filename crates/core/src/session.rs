//! Session Stage Machine
//!
//! One `SessionState` per user session, owned explicitly and passed by
//! reference; there is no ambient global. Stages run in a fixed linear
//! order, each entered only by an explicit user action, and generated data
//! is memoized by presence so no stage's generation runs twice. The one
//! backward move is an explicit topic reset, which discards everything
//! downstream.

use crate::normalize::Recovery;
use crate::plan::{ChatTurn, Prerequisite, ProficiencyLevel, ResourceSet, Roadmap};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write;

/// The linear user journey. No backward transitions; `ChatOpen` self-loops
/// on chat turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TopicInput,
    PrerequisitesAssessment,
    SubtopicSelection,
    RoadmapResourcesContent,
    ChatOpen,
}

/// The generation operations, used to label parse warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    Prerequisites,
    Subtopics,
    Roadmap,
    Resources,
    Content,
}

impl fmt::Display for GenerationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationKind::Prerequisites => write!(f, "prerequisites"),
            GenerationKind::Subtopics => write!(f, "subtopics"),
            GenerationKind::Roadmap => write!(f, "roadmap"),
            GenerationKind::Resources => write!(f, "resources"),
            GenerationKind::Content => write!(f, "content"),
        }
    }
}

/// A non-blocking record that a generation fell back to its stage default.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ParseWarning {
    pub operation: GenerationKind,
    pub recovery: Recovery,
}

/// Guard violations. The interface prevents these from advancing the
/// machine; they are never fatal.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("unknown prerequisite: {0}")]
    UnknownPrerequisite(String),
    #[error("unknown subtopic: {0}")]
    UnknownSubtopic(String),
    #[error("at least one subtopic must be selected")]
    EmptySelection,
    #[error("every prerequisite needs a proficiency rating first")]
    AssessmentIncomplete,
    #[error("action not available in stage {0:?}")]
    WrongStage(Stage),
}

/// All accumulated state for one session. Lives for the session, destroyed
/// with it; nothing persists across restarts.
#[derive(Debug, Clone)]
pub struct SessionState {
    topic: String,
    stage: Stage,
    prerequisites: Option<Vec<Prerequisite>>,
    proficiency: BTreeMap<String, ProficiencyLevel>,
    subtopics: Option<Vec<String>>,
    selected_subtopics: Vec<String>,
    roadmap: Option<Roadmap>,
    resources: Option<ResourceSet>,
    content: Option<String>,
    transcript: Vec<ChatTurn>,
    warnings: Vec<ParseWarning>,
}

impl SessionState {
    /// Starts a session for a topic. The topic must be non-empty and is
    /// immutable for the session unless explicitly reset.
    pub fn new(topic: &str) -> Result<Self, SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        Ok(Self {
            topic: topic.to_string(),
            stage: Stage::TopicInput,
            prerequisites: None,
            proficiency: BTreeMap::new(),
            subtopics: None,
            selected_subtopics: Vec::new(),
            roadmap: None,
            resources: None,
            content: None,
            transcript: Vec::new(),
            warnings: Vec::new(),
        })
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn prerequisites(&self) -> Option<&[Prerequisite]> {
        self.prerequisites.as_deref()
    }

    pub fn proficiency(&self) -> &BTreeMap<String, ProficiencyLevel> {
        &self.proficiency
    }

    pub fn subtopics(&self) -> Option<&[String]> {
        self.subtopics.as_deref()
    }

    pub fn selected_subtopics(&self) -> &[String] {
        &self.selected_subtopics
    }

    pub fn roadmap(&self) -> Option<&Roadmap> {
        self.roadmap.as_ref()
    }

    pub fn resources(&self) -> Option<&ResourceSet> {
        self.resources.as_ref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn transcript(&self) -> &[ChatTurn] {
        &self.transcript
    }

    pub fn warnings(&self) -> &[ParseWarning] {
        &self.warnings
    }

    /// Changes the topic and discards all downstream stage data, including
    /// the transcript. The machine returns to `TopicInput` so prerequisite
    /// generation runs fresh.
    pub fn reset_topic(&mut self, topic: &str) -> Result<(), SessionError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(SessionError::EmptyTopic);
        }
        self.topic = topic.to_string();
        self.stage = Stage::TopicInput;
        self.prerequisites = None;
        self.proficiency.clear();
        self.subtopics = None;
        self.selected_subtopics.clear();
        self.roadmap = None;
        self.resources = None;
        self.content = None;
        self.transcript.clear();
        self.warnings.clear();
        Ok(())
    }

    /// Stores the generated prerequisites, deduplicated by name (first
    /// occurrence wins), and enters the assessment stage.
    pub(crate) fn set_prerequisites(&mut self, prerequisites: Vec<Prerequisite>) {
        let mut unique: Vec<Prerequisite> = Vec::with_capacity(prerequisites.len());
        for prereq in prerequisites {
            if !unique.iter().any(|p| p.name == prereq.name) {
                unique.push(prereq);
            }
        }
        self.prerequisites = Some(unique);
        self.stage = Stage::PrerequisitesAssessment;
    }

    /// Records the user's proficiency rating for one known prerequisite.
    pub fn rate_proficiency(
        &mut self,
        name: &str,
        level: ProficiencyLevel,
    ) -> Result<(), SessionError> {
        if self.stage != Stage::PrerequisitesAssessment {
            return Err(SessionError::WrongStage(self.stage));
        }
        let known = self
            .prerequisites
            .as_deref()
            .is_some_and(|prereqs| prereqs.iter().any(|p| p.name == name));
        if !known {
            return Err(SessionError::UnknownPrerequisite(name.to_string()));
        }
        self.proficiency.insert(name.to_string(), level);
        Ok(())
    }

    /// True once every prerequisite carries a rating. Gates subtopic
    /// generation.
    pub fn proficiency_complete(&self) -> bool {
        match self.prerequisites.as_deref() {
            Some(prereqs) => prereqs
                .iter()
                .all(|p| self.proficiency.contains_key(&p.name)),
            None => false,
        }
    }

    /// Stores the generated subtopics, deduplicated, and enters the
    /// selection stage.
    pub(crate) fn set_subtopics(&mut self, subtopics: Vec<String>) {
        let mut unique: Vec<String> = Vec::with_capacity(subtopics.len());
        for subtopic in subtopics {
            if !unique.contains(&subtopic) {
                unique.push(subtopic);
            }
        }
        self.subtopics = Some(unique);
        self.stage = Stage::SubtopicSelection;
    }

    /// Records the user's subtopic selection. At least one subtopic, and
    /// every name must come from the generated list.
    pub fn select_subtopics(&mut self, names: &[String]) -> Result<(), SessionError> {
        if self.stage != Stage::SubtopicSelection {
            return Err(SessionError::WrongStage(self.stage));
        }
        if names.is_empty() {
            return Err(SessionError::EmptySelection);
        }
        let available = self.subtopics.as_deref().unwrap_or(&[]);
        for name in names {
            if !available.contains(name) {
                return Err(SessionError::UnknownSubtopic(name.clone()));
            }
        }
        // A changed selection invalidates any plan pieces already generated
        // for the old one (possible after a partial plan failure), so they
        // are discarded along with their warnings and regenerate fresh.
        if self.selected_subtopics.as_slice() != names {
            self.roadmap = None;
            self.resources = None;
            self.content = None;
            self.warnings.retain(|w| {
                !matches!(
                    w.operation,
                    GenerationKind::Roadmap | GenerationKind::Resources | GenerationKind::Content
                )
            });
        }
        self.selected_subtopics = names.to_vec();
        Ok(())
    }

    pub(crate) fn store_roadmap(&mut self, roadmap: Roadmap) {
        self.roadmap = Some(roadmap);
    }

    pub(crate) fn store_resources(&mut self, resources: ResourceSet) {
        self.resources = Some(resources);
    }

    pub(crate) fn store_content(&mut self, content: String) {
        self.content = Some(content);
    }

    /// Advances to the plan stage once roadmap, resources, and content are
    /// all present. Safe to call after each individual generation.
    pub(crate) fn try_complete_plan(&mut self) {
        if self.stage == Stage::SubtopicSelection
            && self.roadmap.is_some()
            && self.resources.is_some()
            && self.content.is_some()
        {
            self.stage = Stage::RoadmapResourcesContent;
        }
    }

    /// Enters the chat stage. Unconditional once the plan stage is reached.
    pub(crate) fn open_chat(&mut self) -> Result<(), SessionError> {
        match self.stage {
            Stage::RoadmapResourcesContent => {
                self.stage = Stage::ChatOpen;
                Ok(())
            }
            Stage::ChatOpen => Ok(()),
            other => Err(SessionError::WrongStage(other)),
        }
    }

    /// Appends a turn to the transcript. Append-only; turns are never
    /// reordered or deleted.
    pub(crate) fn push_turn(&mut self, turn: ChatTurn) {
        self.transcript.push(turn);
    }

    pub(crate) fn record_warning(&mut self, operation: GenerationKind, recovery: Recovery) {
        self.warnings.push(ParseWarning {
            operation,
            recovery,
        });
    }

    /// Builds the free-text chat context from the accumulated session state
    /// plus at most `turn_cap` of the most recent transcript turns. The
    /// stored transcript itself stays unbounded.
    pub fn chat_context(&self, turn_cap: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Topic: {}", self.topic);

        if !self.proficiency.is_empty() {
            let _ = writeln!(out, "Prerequisite proficiency:");
            for (name, level) in &self.proficiency {
                let _ = writeln!(out, "- {}: {}", name, level);
            }
        }

        if !self.selected_subtopics.is_empty() {
            let _ = writeln!(
                out,
                "Selected subtopics: {}",
                self.selected_subtopics.join(", ")
            );
        }

        let tail_start = self.transcript.len().saturating_sub(turn_cap);
        if tail_start < self.transcript.len() {
            let _ = writeln!(out, "Conversation so far:");
            for turn in &self.transcript[tail_start..] {
                let _ = writeln!(out, "{}: {}", turn.role, turn.content);
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ChatRole, RecommendedLevel};

    fn prereq(name: &str) -> Prerequisite {
        Prerequisite {
            name: name.to_string(),
            recommended_level: RecommendedLevel::Basic,
        }
    }

    fn session_with_prereqs(names: &[&str]) -> SessionState {
        let mut session = SessionState::new("Graph Theory").unwrap();
        session.set_prerequisites(names.iter().map(|n| prereq(n)).collect());
        session
    }

    #[test]
    fn empty_topic_is_rejected() {
        assert_eq!(SessionState::new("  ").unwrap_err(), SessionError::EmptyTopic);
    }

    #[test]
    fn new_session_starts_at_topic_input() {
        let session = SessionState::new("Graph Theory").unwrap();
        assert_eq!(session.stage(), Stage::TopicInput);
        assert!(session.prerequisites().is_none());
    }

    #[test]
    fn every_prerequisite_needs_a_rating_before_assessment_completes() {
        let mut session =
            session_with_prereqs(&["Sets", "Functions", "Proofs", "Combinatorics"]);

        for name in ["Sets", "Functions", "Proofs"] {
            session
                .rate_proficiency(name, ProficiencyLevel::Beginner)
                .unwrap();
            assert!(!session.proficiency_complete());
        }

        session
            .rate_proficiency("Combinatorics", ProficiencyLevel::Intermediate)
            .unwrap();
        assert!(session.proficiency_complete());
    }

    #[test]
    fn rating_an_unknown_prerequisite_is_rejected() {
        let mut session = session_with_prereqs(&["Sets"]);
        let err = session
            .rate_proficiency("Topology", ProficiencyLevel::Advanced)
            .unwrap_err();
        assert_eq!(err, SessionError::UnknownPrerequisite("Topology".to_string()));
    }

    #[test]
    fn prerequisites_are_unique_by_name() {
        let mut session = SessionState::new("Graph Theory").unwrap();
        session.set_prerequisites(vec![prereq("Sets"), prereq("Sets"), prereq("Proofs")]);
        assert_eq!(session.prerequisites().unwrap().len(), 2);
    }

    #[test]
    fn selection_requires_generated_subtopics_and_at_least_one_choice() {
        let mut session = session_with_prereqs(&["Sets"]);
        session
            .rate_proficiency("Sets", ProficiencyLevel::Beginner)
            .unwrap();
        session.set_subtopics(vec!["Paths".to_string(), "Cycles".to_string()]);

        assert_eq!(
            session.select_subtopics(&[]).unwrap_err(),
            SessionError::EmptySelection
        );
        assert_eq!(
            session
                .select_subtopics(&["Colorings".to_string()])
                .unwrap_err(),
            SessionError::UnknownSubtopic("Colorings".to_string())
        );

        session.select_subtopics(&["Paths".to_string()]).unwrap();
        assert_eq!(session.selected_subtopics(), ["Paths".to_string()]);
    }

    #[test]
    fn changed_selection_discards_generated_plan_pieces() {
        let mut session = session_with_prereqs(&["Sets"]);
        session
            .rate_proficiency("Sets", ProficiencyLevel::Beginner)
            .unwrap();
        session.set_subtopics(vec!["Paths".to_string(), "Cycles".to_string()]);
        session.select_subtopics(&["Paths".to_string()]).unwrap();

        // Only the roadmap landed before a failure interrupted the plan.
        session.store_roadmap(Roadmap { weeks: vec![] });
        session.record_warning(GenerationKind::Roadmap, Recovery::Default);

        session.select_subtopics(&["Cycles".to_string()]).unwrap();
        assert_eq!(session.selected_subtopics(), ["Cycles".to_string()]);
        assert!(session.roadmap().is_none());
        assert!(session.warnings().is_empty());

        // Re-submitting the same selection keeps what is already there.
        session.store_roadmap(Roadmap { weeks: vec![] });
        session.select_subtopics(&["Cycles".to_string()]).unwrap();
        assert!(session.roadmap().is_some());
    }

    #[test]
    fn plan_stage_requires_all_three_generations() {
        let mut session = session_with_prereqs(&["Sets"]);
        session
            .rate_proficiency("Sets", ProficiencyLevel::Beginner)
            .unwrap();
        session.set_subtopics(vec!["Paths".to_string()]);
        session.select_subtopics(&["Paths".to_string()]).unwrap();

        session.store_roadmap(Roadmap { weeks: vec![] });
        session.try_complete_plan();
        assert_eq!(session.stage(), Stage::SubtopicSelection);

        session.store_resources(ResourceSet::placeholder());
        session.store_content("notes".to_string());
        session.try_complete_plan();
        assert_eq!(session.stage(), Stage::RoadmapResourcesContent);
    }

    #[test]
    fn chat_cannot_open_before_the_plan_stage() {
        let mut session = session_with_prereqs(&["Sets"]);
        assert!(matches!(
            session.open_chat(),
            Err(SessionError::WrongStage(Stage::PrerequisitesAssessment))
        ));
    }

    #[test]
    fn reset_topic_discards_all_downstream_data() {
        let mut session = session_with_prereqs(&["Sets"]);
        session
            .rate_proficiency("Sets", ProficiencyLevel::Beginner)
            .unwrap();
        session.set_subtopics(vec!["Paths".to_string()]);
        session.select_subtopics(&["Paths".to_string()]).unwrap();
        session.store_roadmap(Roadmap { weeks: vec![] });
        session.record_warning(GenerationKind::Roadmap, Recovery::Default);

        session.reset_topic("Number Theory").unwrap();

        assert_eq!(session.topic(), "Number Theory");
        assert_eq!(session.stage(), Stage::TopicInput);
        assert!(session.prerequisites().is_none());
        assert!(session.proficiency().is_empty());
        assert!(session.subtopics().is_none());
        assert!(session.selected_subtopics().is_empty());
        assert!(session.roadmap().is_none());
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn chat_context_caps_the_transcript_tail() {
        let mut session = session_with_prereqs(&["Sets"]);
        session
            .rate_proficiency("Sets", ProficiencyLevel::Beginner)
            .unwrap();
        for i in 0..10 {
            session.push_turn(ChatTurn::user(format!("question {i}")));
            session.push_turn(ChatTurn::assistant(format!("answer {i}")));
        }

        let context = session.chat_context(4);
        assert!(context.contains("Topic: Graph Theory"));
        assert!(context.contains("answer 9"));
        assert!(context.contains("question 8"));
        assert!(!context.contains("question 7"));
    }

    #[test]
    fn transcript_is_append_only_in_order() {
        let mut session = session_with_prereqs(&["Sets"]);
        session.push_turn(ChatTurn::user("first"));
        session.push_turn(ChatTurn::assistant("second"));

        let roles: Vec<ChatRole> = session.transcript().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![ChatRole::User, ChatRole::Assistant]);
    }
}
