//! crates/study_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};

/// A subject the user is studying towards, with a target amount of hours
/// and an optional exam date.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub id: i64,
    pub name: String,
    pub target_hours: f64,
    pub exam_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    /// Sum of the durations of all sessions logged against this module.
    /// Always computed from the current sessions at read time, never stored.
    pub actual_hours: f64,
}

/// A single logged unit of studying against one module.
#[derive(Debug, Clone, PartialEq)]
pub struct StudySession {
    pub id: i64,
    pub module_id: i64,
    /// Name of the owning module, resolved at read time. `None` if the
    /// parent module disappeared between lookup and read.
    pub module_name: Option<String>,
    /// Duration in hours. Always > 0.
    pub duration: f64,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An AI-generated study plan. Independent of modules and sessions;
/// only the most recently created one is ever read back.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub id: i64,
    pub recommendation_text: String,
    pub created_at: DateTime<Utc>,
}

impl Module {
    /// Progress towards the target in percent, rounded to one decimal.
    /// Defined as 0 when the target is 0, so there is no division by zero.
    /// Derived from the rounded `actual_hours`, the same value the API exposes.
    pub fn progress_percentage(&self) -> f64 {
        if self.target_hours == 0.0 {
            return 0.0;
        }
        round_to(round_hours(self.actual_hours) / self.target_hours * 100.0, 1)
    }

    /// Hours still left to study, clamped at 0 once the target is exceeded.
    pub fn remaining_hours(&self) -> f64 {
        (self.target_hours - self.actual_hours).max(0.0)
    }
}

/// Rounds a sum of session durations the way the API exposes it.
pub fn round_hours(hours: f64) -> f64 {
    round_to(hours, 2)
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
