//! Pathways API Library Crate
//!
//! This library contains all the logic for the Pathways web service: the
//! application state, the in-memory session store, API handlers, and
//! routing. The binaries are thin wrappers around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod store;
