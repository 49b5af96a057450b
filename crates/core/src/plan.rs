//! Learning-Plan Data Model
//!
//! This module defines the structured values produced by each generation
//! stage: prerequisites, the week-by-week roadmap, the curated resource set,
//! and chat transcript turns. All types follow the wire shapes the prompt
//! templates ask the model to emit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Difficulty level the model recommends for a prerequisite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecommendedLevel {
    Basic,
    Intermediate,
    Advanced,
}

/// Proficiency level the user declares for a prerequisite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for ProficiencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProficiencyLevel::Beginner => write!(f, "Beginner"),
            ProficiencyLevel::Intermediate => write!(f, "Intermediate"),
            ProficiencyLevel::Advanced => write!(f, "Advanced"),
        }
    }
}

/// A prerequisite the model derived for the session topic.
///
/// On the wire the model emits `{"topic": "...", "level": "Basic"}`, so the
/// fields are renamed accordingly. Prerequisites are unique by name within
/// a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prerequisite {
    #[serde(rename = "topic")]
    pub name: String,
    #[serde(rename = "level")]
    pub recommended_level: RecommendedLevel,
}

impl Prerequisite {
    /// The single generic entry used when prerequisite parsing fails outright.
    pub fn fallback() -> Self {
        Self {
            name: "General foundations of the subject".to_string(),
            recommended_level: RecommendedLevel::Basic,
        }
    }
}

/// One week of the generated learning roadmap.
///
/// Only `week` is strictly required on the wire; models occasionally drop a
/// list field, and a missing list should not discard an otherwise usable
/// roadmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoadmapWeek {
    pub week: u32,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub exercises: Vec<String>,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub hours_per_week: f32,
}

/// An ordered sequence of roadmap weeks.
///
/// Week numbers are expected to be unique and increasing; that is a contract
/// with the prompt, not enforced here, so violating input passes through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Roadmap {
    pub weeks: Vec<RoadmapWeek>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Textbook {
    pub title: String,
    pub author: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Paper {
    pub title: String,
    pub authors: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub title: String,
    pub platform: String,
    pub link: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InteractivePlatform {
    pub name: String,
    pub description: String,
    pub link: String,
}

/// Sentinel used for links in the placeholder resource set.
pub const PLACEHOLDER_LINK: &str = "#";

/// Fixed placeholder used for the video field when resource parsing fails.
pub const PLACEHOLDER_VIDEO_URL: &str =
    "https://www.youtube.com/results?search_query=introductory+lectures";

/// The curated resource collection for the selected subtopics.
///
/// The prompt asks for exactly 3 textbooks, 3 papers, 1 video, 2 courses and
/// 2 interactive platforms. Those counts are a contract with the prompt; the
/// parser tolerates fewer. All five keys must be present for a decode to
/// count as a success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceSet {
    pub textbooks: Vec<Textbook>,
    pub papers: Vec<Paper>,
    pub youtube: String,
    pub courses: Vec<Course>,
    pub interactive_platforms: Vec<InteractivePlatform>,
}

impl ResourceSet {
    /// Full placeholder structure used when resource parsing fails outright.
    pub fn placeholder() -> Self {
        Self {
            textbooks: vec![Textbook {
                title: "An introductory textbook on the subject".to_string(),
                author: "Unknown".to_string(),
                link: PLACEHOLDER_LINK.to_string(),
            }],
            papers: vec![Paper {
                title: "A survey paper on the subject".to_string(),
                authors: "Unknown".to_string(),
                link: PLACEHOLDER_LINK.to_string(),
            }],
            youtube: PLACEHOLDER_VIDEO_URL.to_string(),
            courses: vec![Course {
                title: "An introductory online course".to_string(),
                platform: "Unknown".to_string(),
                link: PLACEHOLDER_LINK.to_string(),
            }],
            interactive_platforms: vec![InteractivePlatform {
                name: "An interactive practice platform".to_string(),
                description: "Hands-on exercises for the selected subtopics".to_string(),
                link: PLACEHOLDER_LINK.to_string(),
            }],
        }
    }
}

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "User"),
            ChatRole::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One turn of the topic-scoped chat transcript. Append-only, never
/// reordered or deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}
