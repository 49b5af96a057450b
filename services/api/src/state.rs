//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources: the in-memory session store, the orchestrator, and
//! the loaded configuration.

use crate::config::Config;
use crate::store::SessionStore;
use pathways_core::orchestrator::Orchestrator;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all
/// handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: SessionStore,
    pub orchestrator: Arc<Orchestrator>,
    pub config: Arc<Config>,
}
