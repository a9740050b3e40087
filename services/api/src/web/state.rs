//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use study_tracker_core::ports::{DatabaseService, PlanGenerationService};

/// The shared application state, created once at startup and passed to all handlers.
///
/// There is no other in-process mutable state; every aggregate the API exposes
/// is computed from the store on read.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub plan: Arc<dyn PlanGenerationService>,
    pub config: Arc<Config>,
}
