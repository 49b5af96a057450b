//! Per-Stage Prompt Builders
//!
//! Pure functions mapping (stage, inputs) to prompt text. Every template
//! embeds an explicit output-shape example and a hard instruction to emit
//! only that shape, because the normalizer depends on it. Topic validation
//! happens in [`crate::session::SessionState`], not here.

use crate::plan::ProficiencyLevel;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Renders the user's proficiency ratings as one `name: level` line each.
fn proficiency_lines(proficiency: &BTreeMap<String, ProficiencyLevel>) -> String {
    let mut out = String::new();
    for (name, level) in proficiency {
        let _ = writeln!(out, "- {}: {}", name, level);
    }
    out
}

/// Renders a subtopic selection as a comma-separated list.
fn selection_list(selected: &[String]) -> String {
    selected.join(", ")
}

/// Prompt for deriving prerequisites from the session topic.
pub fn prerequisites(topic: &str) -> String {
    format!(
        r#"Generate a list of essential prerequisites for the topic '{topic}'.
For each prerequisite, recommend the depth of understanding required: Basic, Intermediate, or Advanced.
IMPORTANT: Respond with ONLY a JSON object in exactly this shape, with no prose and no markdown fencing:
{{"prerequisites": [{{"topic": "prerequisite name", "level": "Basic"}}, {{"topic": "another prerequisite", "level": "Intermediate"}}]}}"#
    )
}

/// Prompt for deriving subtopics, tuned to the user's prerequisite
/// proficiency.
pub fn subtopics(topic: &str, proficiency: &BTreeMap<String, ProficiencyLevel>) -> String {
    format!(
        r#"Based on the topic '{topic}' and the user's declared proficiency levels:
{proficiency}
Generate relevant subtopics for their level of understanding.
IMPORTANT: Respond with ONLY a JSON object in exactly this shape, with no prose and no markdown fencing:
{{"subtopics": ["subtopic 1", "subtopic 2", "subtopic 3"]}}"#,
        proficiency = proficiency_lines(proficiency),
    )
}

/// Prompt for the week-by-week roadmap over the selected subtopics.
pub fn roadmap(
    topic: &str,
    selected: &[String],
    proficiency: &BTreeMap<String, ProficiencyLevel>,
) -> String {
    format!(
        r#"Create a week-by-week learning roadmap for {topic} focusing on these subtopics: {selected}.
Consider the user's prerequisite knowledge:
{proficiency}
IMPORTANT: Respond with ONLY a JSON object in exactly this shape, with no prose and no markdown fencing:
{{"roadmap": [{{"week": 1, "goals": ["goal 1"], "activities": ["activity 1"], "exercises": ["exercise 1"], "project": "a small project", "hours_per_week": 6}}]}}
Week numbers must start at 1, be unique, and increase."#,
        selected = selection_list(selected),
        proficiency = proficiency_lines(proficiency),
    )
}

/// Prompt for the curated resource set over the selected subtopics.
pub fn resources(topic: &str, selected: &[String]) -> String {
    format!(
        r#"Curate learning resources for {topic}, covering these subtopics: {selected}.
Provide exactly 3 textbooks, 3 papers, 1 YouTube video URL, 2 online courses, and 2 interactive platforms.
IMPORTANT: Respond with ONLY a JSON object in exactly this shape, with no prose and no markdown fencing:
{{"textbooks": [{{"title": "t", "author": "a", "link": "url"}}], "papers": [{{"title": "t", "authors": "a", "link": "url"}}], "youtube": "url", "courses": [{{"title": "t", "platform": "p", "link": "url"}}], "interactive_platforms": [{{"name": "n", "description": "d", "link": "url"}}]}}"#,
        selected = selection_list(selected),
    )
}

/// Prompt for the prose content summary of the selected subtopics. The only
/// stage that asks for text rather than JSON.
pub fn content(selected: &[String]) -> String {
    format!(
        r#"Write concise study notes summarizing the following subtopics for a learner who is just starting them: {selected}.
Cover the key ideas of each subtopic in a few short paragraphs of plain text.
Do not wrap the answer in code fences."#,
        selected = selection_list(selected),
    )
}

/// Prompt for one topic-scoped chat turn. `context` carries the accumulated
/// session state plus the bounded transcript tail as free text.
pub fn chat(topic: &str, context: &str, question: &str) -> String {
    format!(
        r#"You are an educational assistant helping a student learn {topic}.
Session context:
{context}
Student's question: {question}
Provide a helpful, specific answer grounded in the session context."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_proficiency() -> BTreeMap<String, ProficiencyLevel> {
        let mut map = BTreeMap::new();
        map.insert("Arithmetic".to_string(), ProficiencyLevel::Beginner);
        map.insert("Set Theory".to_string(), ProficiencyLevel::Intermediate);
        map
    }

    #[test]
    fn prerequisites_prompt_embeds_topic_and_shape() {
        let prompt = prerequisites("Linear Algebra");
        assert!(prompt.contains("Linear Algebra"));
        assert!(prompt.contains(r#""prerequisites""#));
        assert!(prompt.contains("ONLY"));
    }

    #[test]
    fn subtopics_prompt_embeds_proficiency_lines() {
        let prompt = subtopics("Linear Algebra", &sample_proficiency());
        assert!(prompt.contains("- Arithmetic: Beginner"));
        assert!(prompt.contains("- Set Theory: Intermediate"));
        assert!(prompt.contains(r#""subtopics""#));
    }

    #[test]
    fn roadmap_prompt_embeds_selection() {
        let selected = vec!["Vectors".to_string(), "Matrices".to_string()];
        let prompt = roadmap("Linear Algebra", &selected, &sample_proficiency());
        assert!(prompt.contains("Vectors, Matrices"));
        assert!(prompt.contains(r#""roadmap""#));
        assert!(prompt.contains(r#""hours_per_week""#));
    }

    #[test]
    fn resources_prompt_names_all_five_keys() {
        let selected = vec!["Vectors".to_string()];
        let prompt = resources("Linear Algebra", &selected);
        for key in [
            "\"textbooks\"",
            "\"papers\"",
            "\"youtube\"",
            "\"courses\"",
            "\"interactive_platforms\"",
        ] {
            assert!(prompt.contains(key), "missing {key}");
        }
    }

    #[test]
    fn chat_prompt_carries_context_and_question() {
        let prompt = chat("Linear Algebra", "Topic: Linear Algebra", "What is a vector?");
        assert!(prompt.contains("Student's question: What is a vector?"));
        assert!(prompt.contains("Topic: Linear Algebra"));
    }
}
