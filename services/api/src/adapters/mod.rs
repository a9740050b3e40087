pub mod db;
pub mod plan_llm;

pub use db::DbAdapter;
pub use plan_llm::OpenAiPlanAdapter;
