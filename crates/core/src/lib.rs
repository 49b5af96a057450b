//! Pathways Core
//!
//! The reproducible core of the learning-path generator: per-stage prompt
//! builders, the response normalizer with tiered fallback recovery, the
//! linear session stage machine, and the orchestrator that drives one
//! generation call per stage against an external LLM collaborator.

pub mod llm;
pub mod normalize;
pub mod orchestrator;
pub mod plan;
pub mod prompt;
pub mod session;
