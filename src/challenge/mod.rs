//! Skill-validation challenges: template catalog, execution and grading.

pub mod catalog;
pub mod executor;
pub mod grader;
pub mod types;

#[cfg(test)]
mod tests;

pub use catalog::ChallengeCatalog;
pub use executor::{CodeExecutor, ExecutionError, SimulatedExecutor};
pub use grader::{ChallengeGrader, calculate_skill_confidence, calculate_skill_confidence_at};
pub use types::*;
