pub mod domain;
pub mod ports;

pub use domain::{Module, Recommendation, StudySession};
pub use ports::{DatabaseService, PlanGenerationService, PortError, PortResult};
