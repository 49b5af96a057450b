//! Generation Orchestrator
//!
//! Drives every stage the same way: guard check, presence check (each
//! generation runs at most once per session), build prompt, invoke the LLM
//! collaborator, normalize, store, advance. Invocation failures leave the
//! stage's data absent so the user can re-trigger the action; parse
//! failures never escalate past a recorded warning.

use crate::llm::{LlmClient, LlmError};
use crate::normalize;
use crate::plan::ChatTurn;
use crate::prompt;
use crate::session::{GenerationKind, SessionError, SessionState, Stage};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// A stage guard was not satisfied. The interface should prevent this;
    /// when it surfaces, the action is simply unavailable.
    #[error("stage precondition not met: {0}")]
    Precondition(#[from] SessionError),
    /// The external collaborator failed. The stage's data stays absent and
    /// the user must re-trigger; no automatic retry.
    #[error("model invocation failed: {0}")]
    Invocation(#[from] LlmError),
}

/// Glues the prompt builder, the LLM collaborator, the normalizer, and the
/// session stage machine together.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    chat_context_turns: usize,
}

impl Orchestrator {
    /// `chat_context_turns` bounds how much transcript tail the chat prompt
    /// carries; the stored transcript itself is unbounded.
    pub fn new(llm: Arc<dyn LlmClient>, chat_context_turns: usize) -> Self {
        Self {
            llm,
            chat_context_turns,
        }
    }

    /// Derives prerequisites for the session topic. Memoized: a repeat call
    /// with data already present is a no-op success.
    pub async fn generate_prerequisites(
        &self,
        session: &mut SessionState,
    ) -> Result<(), OrchestratorError> {
        if session.prerequisites().is_some() {
            return Ok(());
        }

        let raw = self.llm.invoke(&prompt::prerequisites(session.topic())).await?;
        let normalized = normalize::prerequisites(&raw);
        if normalized.degraded() {
            session.record_warning(GenerationKind::Prerequisites, normalized.recovery);
        }
        info!(
            topic = %session.topic(),
            count = normalized.value.len(),
            "prerequisites generated"
        );
        session.set_prerequisites(normalized.value);
        Ok(())
    }

    /// Derives subtopics once every prerequisite carries a proficiency
    /// rating. Memoized like all generations.
    pub async fn generate_subtopics(
        &self,
        session: &mut SessionState,
    ) -> Result<(), OrchestratorError> {
        if session.subtopics().is_some() {
            return Ok(());
        }
        if session.stage() != Stage::PrerequisitesAssessment || !session.proficiency_complete() {
            return Err(SessionError::AssessmentIncomplete.into());
        }

        let raw = self
            .llm
            .invoke(&prompt::subtopics(session.topic(), session.proficiency()))
            .await?;
        let normalized = normalize::subtopics(&raw, session.topic());
        if normalized.degraded() {
            session.record_warning(GenerationKind::Subtopics, normalized.recovery);
        }
        info!(
            topic = %session.topic(),
            count = normalized.value.len(),
            "subtopics generated"
        );
        session.set_subtopics(normalized.value);
        Ok(())
    }

    /// Generates the roadmap, resource set, and content summary for the
    /// current selection. The three are independent and individually
    /// memoized, so after a partial failure only the missing pieces run
    /// again.
    pub async fn generate_plan(&self, session: &mut SessionState) -> Result<(), OrchestratorError> {
        if session.stage() == Stage::SubtopicSelection && session.selected_subtopics().is_empty() {
            return Err(SessionError::EmptySelection.into());
        }
        if session.stage() < Stage::SubtopicSelection {
            return Err(SessionError::WrongStage(session.stage()).into());
        }

        if session.roadmap().is_none() {
            let raw = self
                .llm
                .invoke(&prompt::roadmap(
                    session.topic(),
                    session.selected_subtopics(),
                    session.proficiency(),
                ))
                .await?;
            let normalized = normalize::roadmap(&raw);
            if normalized.degraded() {
                session.record_warning(GenerationKind::Roadmap, normalized.recovery);
            }
            info!(weeks = normalized.value.weeks.len(), "roadmap generated");
            session.store_roadmap(normalized.value);
        }

        if session.resources().is_none() {
            let raw = self
                .llm
                .invoke(&prompt::resources(
                    session.topic(),
                    session.selected_subtopics(),
                ))
                .await?;
            let normalized = normalize::resources(&raw);
            if normalized.degraded() {
                session.record_warning(GenerationKind::Resources, normalized.recovery);
            }
            info!("resources generated");
            session.store_resources(normalized.value);
        }

        if session.content().is_none() {
            let raw = self
                .llm
                .invoke(&prompt::content(session.selected_subtopics()))
                .await?;
            let normalized = normalize::content(&raw);
            if normalized.degraded() {
                session.record_warning(GenerationKind::Content, normalized.recovery);
            }
            info!("content summary generated");
            session.store_content(normalized.value);
        }

        session.try_complete_plan();
        Ok(())
    }

    /// Runs one chat turn. The first message is the explicit action that
    /// enters `ChatOpen`; after that the stage self-loops. The user turn is
    /// appended only when the collaborator answered, keeping the append-only
    /// transcript consistent with what the model actually saw.
    pub async fn chat(
        &self,
        session: &mut SessionState,
        question: &str,
    ) -> Result<String, OrchestratorError> {
        session.open_chat()?;

        let context = session.chat_context(self.chat_context_turns);
        let raw = self
            .llm
            .invoke(&prompt::chat(session.topic(), &context, question))
            .await?;

        session.push_turn(ChatTurn::user(question));
        session.push_turn(ChatTurn::assistant(raw.clone()));
        info!(transcript_len = session.transcript().len(), "chat turn appended");
        Ok(raw)
    }
}
