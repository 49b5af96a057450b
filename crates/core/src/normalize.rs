//! Response Normalization
//!
//! Converts raw model output, which may carry surrounding prose, code
//! fences, or outright garbage, into the stage's structured value. Recovery
//! is a fixed sequence of attempts that stops at the first success:
//!
//! 1. strict decode of the trimmed raw text;
//! 2. decode of the substring between the first opening bracket and the
//!    *last* closing bracket (prose tends to follow the JSON block, so the
//!    greedy-outermost slice beats the first matching pair);
//! 3. decode of the first triple-backtick fenced block (optionally tagged
//!    `json`);
//! 4. the stage-specific minimal default.
//!
//! This module never returns an error. Callers always receive a usable
//! value; reaching the default tier is the recoverable-parse-failure signal
//! they surface as a warning.

use crate::plan::{Prerequisite, Roadmap, RoadmapWeek, ResourceSet};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::warn;

/// Which recovery tier produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recovery {
    Direct,
    BracketSlice,
    FencedBlock,
    Default,
}

/// A normalized stage value together with how it was recovered.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
    pub value: T,
    pub recovery: Recovery,
}

impl<T> Normalized<T> {
    /// True when the value is the stage default, i.e. parsing failed at
    /// every tier.
    pub fn degraded(&self) -> bool {
        self.recovery == Recovery::Default
    }
}

/// The bracket pair to slice for tier 2.
#[derive(Debug, Clone, Copy)]
enum Shape {
    Object,
}

fn decode<T: DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(text.trim()).ok()
}

/// Greedy-outermost bracket slice: first opening bracket to last closing
/// bracket, even when prose or stray brackets sit in between.
fn bracket_slice(raw: &str, shape: Shape) -> Option<&str> {
    let (open, close) = match shape {
        Shape::Object => ('{', '}'),
    };
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    if end > start { Some(&raw[start..=end]) } else { None }
}

/// Extracts the body of the first fenced block, tolerating a `json` tag.
fn fenced_block(raw: &str) -> Option<&str> {
    if let Some((_, rest)) = raw.split_once("```json") {
        return rest.split("```").next();
    }
    let mut parts = raw.split("```");
    parts.next()?;
    parts.next()
}

fn normalize<T: DeserializeOwned>(
    operation: &'static str,
    raw: &str,
    shape: Shape,
    default: impl FnOnce() -> T,
) -> Normalized<T> {
    if let Some(value) = decode(raw) {
        return Normalized {
            value,
            recovery: Recovery::Direct,
        };
    }

    if let Some(slice) = bracket_slice(raw, shape) {
        if let Some(value) = decode(slice) {
            warn!(operation, "recovered model output by bracket slicing");
            return Normalized {
                value,
                recovery: Recovery::BracketSlice,
            };
        }
    }

    if let Some(block) = fenced_block(raw) {
        if let Some(value) = decode(block) {
            warn!(operation, "recovered model output from a fenced code block");
            return Normalized {
                value,
                recovery: Recovery::FencedBlock,
            };
        }
    }

    warn!(
        operation,
        raw_len = raw.len(),
        "model output unparseable at every tier, applying stage default"
    );
    Normalized {
        value: default(),
        recovery: Recovery::Default,
    }
}

// Envelope structs double as the required-top-level-key check: a decode that
// succeeds generically but lacks the stage key fails here and falls through
// to the stage default.

#[derive(Deserialize)]
struct PrerequisitesEnvelope {
    prerequisites: Vec<Prerequisite>,
}

#[derive(Deserialize)]
struct SubtopicsEnvelope {
    subtopics: Vec<String>,
}

#[derive(Deserialize)]
struct RoadmapEnvelope {
    roadmap: Vec<RoadmapWeek>,
}

/// Normalizes the prerequisites stage. Default: one generic low-difficulty
/// entry.
pub fn prerequisites(raw: &str) -> Normalized<Vec<Prerequisite>> {
    let normalized = normalize(
        "prerequisites",
        raw,
        Shape::Object,
        || PrerequisitesEnvelope {
            prerequisites: vec![Prerequisite::fallback()],
        },
    );
    Normalized {
        value: normalized.value.prerequisites,
        recovery: normalized.recovery,
    }
}

/// Normalizes the subtopics stage. Default: a single generic entry derived
/// from the topic.
pub fn subtopics(raw: &str, topic: &str) -> Normalized<Vec<String>> {
    let normalized = normalize("subtopics", raw, Shape::Object, || SubtopicsEnvelope {
        subtopics: vec![format!("Introduction to {topic}")],
    });
    Normalized {
        value: normalized.value.subtopics,
        recovery: normalized.recovery,
    }
}

/// Normalizes the roadmap stage. Default: a generic three-week plan. Week
/// ordering and uniqueness are passed through as-is.
pub fn roadmap(raw: &str) -> Normalized<Roadmap> {
    let normalized = normalize("roadmap", raw, Shape::Object, || RoadmapEnvelope {
        roadmap: default_weeks(),
    });
    Normalized {
        value: Roadmap {
            weeks: normalized.value.roadmap,
        },
        recovery: normalized.recovery,
    }
}

/// Normalizes the resources stage. All five keys must be present; the item
/// counts the prompt asks for are tolerated when short. Default: the full
/// placeholder structure with sentinel links.
pub fn resources(raw: &str) -> Normalized<ResourceSet> {
    normalize("resources", raw, Shape::Object, ResourceSet::placeholder)
}

/// Normalizes the content stage, the one prose stage: strip a fence that
/// wraps the whole reply and trim. A fence further in is part of the prose,
/// not a wrapper. An empty result falls back to the generic three-step plan.
pub fn content(raw: &str) -> Normalized<String> {
    let trimmed = raw.trim();
    let body = if trimmed.starts_with("```") {
        fenced_block(trimmed).unwrap_or(trimmed).trim()
    } else {
        trimmed
    };
    if body.is_empty() {
        warn!(operation = "content", "empty model output, applying stage default");
        return Normalized {
            value: default_content(),
            recovery: Recovery::Default,
        };
    }
    let recovery = if body.len() == trimmed.len() {
        Recovery::Direct
    } else {
        Recovery::FencedBlock
    };
    Normalized {
        value: body.to_string(),
        recovery,
    }
}

fn default_weeks() -> Vec<RoadmapWeek> {
    let steps = [
        ("Start with the basics", "Read introductory material"),
        ("Practice with exercises", "Work through guided problems"),
        ("Move on to advanced concepts", "Study deeper treatments"),
    ];
    steps
        .iter()
        .enumerate()
        .map(|(i, (goal, activity))| RoadmapWeek {
            week: (i + 1) as u32,
            goals: vec![goal.to_string()],
            activities: vec![activity.to_string()],
            exercises: vec!["Self-check questions".to_string()],
            project: "Summarize what you learned in your own words".to_string(),
            hours_per_week: 5.0,
        })
        .collect()
}

fn default_content() -> String {
    "1. Start with the basics and make sure the fundamentals are solid.\n\
     2. Practice with exercises until the core techniques feel routine.\n\
     3. Move on to advanced concepts and connect them back to the basics."
        .to_string()
}
