//! crates/study_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Module, Recommendation, StudySession};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Module Management ---
    async fn create_module(
        &self,
        name: &str,
        target_hours: f64,
        exam_date: Option<NaiveDate>,
    ) -> PortResult<Module>;

    /// All modules in creation order, each with its computed `actual_hours`.
    async fn list_modules(&self) -> PortResult<Vec<Module>>;

    async fn get_module(&self, module_id: i64) -> PortResult<Module>;

    /// Deletes a module together with every session that references it,
    /// inside a single transaction. Returns the number of sessions removed.
    async fn delete_module(&self, module_id: i64) -> PortResult<u64>;

    // --- Session Management ---
    async fn create_session(
        &self,
        module_id: i64,
        duration: f64,
        date: NaiveDate,
        notes: Option<&str>,
    ) -> PortResult<StudySession>;

    /// All sessions, most recent date first. A positive `limit` truncates
    /// the result; `None` returns everything.
    async fn list_sessions(&self, limit: Option<i64>) -> PortResult<Vec<StudySession>>;

    async fn delete_session(&self, session_id: i64) -> PortResult<()>;

    /// Sessions belonging to one module, most recent date first.
    async fn sessions_for_module(&self, module_id: i64) -> PortResult<Vec<StudySession>>;

    /// Sessions whose date lies within `[start, end]`, both ends inclusive.
    async fn sessions_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> PortResult<Vec<StudySession>>;

    // --- Recommendation Management ---
    async fn save_recommendation(&self, text: &str) -> PortResult<Recommendation>;

    async fn latest_recommendation(&self) -> PortResult<Option<Recommendation>>;
}

#[async_trait]
pub trait PlanGenerationService: Send + Sync {
    /// Sends a fully composed prompt to the text-generation service and
    /// returns the generated study plan.
    async fn generate_plan(&self, prompt: &str) -> PortResult<String>;
}
