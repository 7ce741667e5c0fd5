pub mod config;
pub mod domain;

pub use domain::intent::Intent;
pub use domain::knowledge::{KnowledgeDocument, Plan, Policies, Pricing};
pub use domain::lead::{Lead, LEAD_CAPTURED_STATUS};
pub use domain::session::{FormField, FormStage, SessionState, Speaker, Turn};
