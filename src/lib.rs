//! # Skillgap
//!
//! Core of a skill-gap analysis tool: a rate-limited, privacy-preserving client
//! for a remote skill-analysis service, and an in-process coding-challenge
//! engine that validates self-assessed skill levels.
//!
//! ## Architecture Overview
//!
//! - **[`profile`]**: User skill data and the analysis/plan/progress result types
//! - **[`analysis`]**: Analysis service client with rate limiting, retries and anonymization
//! - **[`challenge`]**: Challenge catalog, code execution seam and grading
//! - **[`cli`]**: Argument parsing and configuration discovery for the binary
//!
//! ## Features
//!
//! ### 🔒 Privacy
//! - **Layered anonymization**: `basic`, `enhanced` and `maximum` levels, applied
//!   to a copy before anything leaves the process
//! - **Stable pseudonyms**: identifiers are replaced by hashed tokens
//!
//! ### 🌐 Analysis Service Client
//! - **Shared hourly window**: clients built over one [`RateLimiter`] share one quota
//! - **Retry with backoff**: timeouts, network and 5xx errors are retried;
//!   429 responses wait for `Retry-After`
//! - **Pluggable transport**: HTTP by default, scripted in tests
//!
//! ### 🧩 Skill Validation
//! - **Template catalog** with category/difficulty/language fallback
//! - **Weighted scoring** with a time bonus, feedback text and confidence updates
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skillgap::{AnalysisClient, ConfigResolver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let resolved = ConfigResolver::standard().resolve()?;
//!     let client = AnalysisClient::new(resolved.config)?;
//!
//!     let health = client.get_service_health().await;
//!     println!("{:?}", health.status);
//!     Ok(())
//! }
//! ```

/// User profile data and analysis result types.
pub mod profile;

/// Remote analysis service client.
///
/// Validation, anonymization, rate limiting and retry around the four
/// service endpoints.
pub mod analysis;

/// Coding challenges used to validate skill levels.
pub mod challenge;

/// Command-line interface support.
pub mod cli;

/// Environment constants and path utilities.
pub mod env;

pub use analysis::{
    AnalysisClient, DataAnonymizer, HealthStatus, PrivacyLevel, RateLimiter, RetryConfig,
    RetryPolicy, ServiceConfig, ServiceConfigUpdate, ServiceError, ServiceHealth,
};
pub use challenge::{
    Challenge, ChallengeCatalog, ChallengeError, ChallengeGrader, ChallengeResult, CodeExecutor,
    Difficulty, SimulatedExecutor, ValidationResult,
};
pub use cli::{ConfigError, ConfigResolver};
pub use profile::{
    AnalysisResult, CareerGoals, PersonalizedPlan, ProgressReport, UserSkill, UserSkillData,
};
