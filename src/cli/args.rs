//! Command line argument parsing
//!
//! Subcommands:
//! - `show-config`: Show configuration discovery information and the resolved config
//! - `save-config`: Persist a configuration to the user config file
//! - `clear-config`: Remove the persisted configuration
//! - `health`: Probe the analysis service
//! - `analyze`: Analyze a user skill profile
//! - `plan`: Generate an improvement plan from an analysis and career goals
//! - `progress`: Compare current skills against earlier analyses
//! - `challenge`: Generate a coding challenge, optionally grading a solution

use crate::analysis::PrivacyLevel;
use crate::challenge::Difficulty;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug)]
pub enum ExecutionMode {
    ShowConfig,
    SaveConfig(SaveConfigOptions),
    ClearConfig { path: Option<PathBuf> },
    Health { test_connection: bool },
    Analyze { user_data: PathBuf },
    Plan { analysis: PathBuf, goals: PathBuf },
    Progress { current: PathBuf, history: Vec<PathBuf> },
    Challenge(ChallengeOptions),
}

#[derive(Debug)]
pub struct SaveConfigOptions {
    pub endpoint: String,
    pub api_key: String,
    pub rate_limit: Option<u32>,
    pub timeout: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub privacy_level: Option<PrivacyLevel>,
    pub path: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ChallengeOptions {
    pub skill_id: String,
    pub skill_name: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub language: Option<String>,
    pub submission: Option<Submission>,
}

/// A solution to grade right after generation.
#[derive(Debug)]
pub struct Submission {
    pub solution: PathBuf,
    pub completion_secs: f64,
    /// JSON `UserSkill` the result is applied to
    pub skill_file: Option<PathBuf>,
}

#[derive(Debug, Parser)]
#[command(name = "skillgap")]
#[command(author = "Skillgap Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Skill-gap analysis: privacy-preserving analysis client and coding-challenge validation"
)]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show configuration discovery information
    ShowConfig,
    /// Save analysis service configuration
    SaveConfig {
        /// Analysis service base URL
        #[arg(long = "endpoint")]
        endpoint: String,
        /// API key (falls back to AI_SERVICE_API_KEY)
        #[arg(long = "api-key", env = "AI_SERVICE_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Requests allowed per hour
        #[arg(long = "rate-limit")]
        rate_limit: Option<u32>,
        /// Per-request timeout in seconds
        #[arg(long = "timeout")]
        timeout: Option<u64>,
        /// Retries after the first attempt
        #[arg(long = "retry-attempts")]
        retry_attempts: Option<u32>,
        /// basic, enhanced or maximum
        #[arg(long = "privacy-level")]
        privacy_level: Option<PrivacyLevel>,
        /// Write to this file instead of ~/.skillgap/config.toml
        #[arg(short = 'o', long = "output")]
        path: Option<PathBuf>,
    },
    /// Remove the saved configuration
    ClearConfig {
        /// Remove this file instead of ~/.skillgap/config.toml
        #[arg(long = "path")]
        path: Option<PathBuf>,
    },
    /// Check analysis service health
    Health {
        /// Also run a one-off connection test with a fresh client
        #[arg(long = "test")]
        test_connection: bool,
    },
    /// Analyze a user skill profile (JSON)
    Analyze {
        /// Path to user skill data
        user_data: PathBuf,
    },
    /// Generate a personalized improvement plan
    Plan {
        /// Path to a previous analysis result (JSON)
        analysis: PathBuf,
        /// Path to career goals (JSON)
        goals: PathBuf,
    },
    /// Track progress against earlier analyses
    Progress {
        /// Path to current user skill data (JSON)
        current: PathBuf,
        /// Earlier analysis results (JSON), oldest first
        #[arg(long = "history", value_name = "FILE")]
        history: Vec<PathBuf>,
    },
    /// Generate a coding challenge and optionally grade a solution
    Challenge {
        #[arg(long = "skill-id")]
        skill_id: String,
        /// Display name substituted into the challenge title
        #[arg(long = "skill-name")]
        skill_name: Option<String>,
        #[arg(long = "category", default_value = "programming")]
        category: String,
        #[arg(short = 'd', long = "difficulty", default_value = "beginner")]
        difficulty: Difficulty,
        #[arg(short = 'l', long = "language")]
        language: Option<String>,
        /// Solution source file to grade
        #[arg(short = 's', long = "solution")]
        solution: Option<PathBuf>,
        /// Seconds taken to solve
        #[arg(short = 't', long = "time", requires = "solution")]
        completion_secs: Option<f64>,
        /// User skill (JSON) to apply the graded result to
        #[arg(long = "skill", requires = "solution")]
        skill_file: Option<PathBuf>,
    },
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }

    pub fn mode(&self) -> Result<ExecutionMode, String> {
        match &self.command {
            Some(Commands::ShowConfig) => Ok(ExecutionMode::ShowConfig),
            Some(Commands::SaveConfig {
                endpoint,
                api_key,
                rate_limit,
                timeout,
                retry_attempts,
                privacy_level,
                path,
            }) => Ok(ExecutionMode::SaveConfig(SaveConfigOptions {
                endpoint: endpoint.clone(),
                api_key: api_key.clone(),
                rate_limit: *rate_limit,
                timeout: *timeout,
                retry_attempts: *retry_attempts,
                privacy_level: *privacy_level,
                path: path.clone(),
            })),
            Some(Commands::ClearConfig { path }) => {
                Ok(ExecutionMode::ClearConfig { path: path.clone() })
            }
            Some(Commands::Health { test_connection }) => Ok(ExecutionMode::Health {
                test_connection: *test_connection,
            }),
            Some(Commands::Analyze { user_data }) => Ok(ExecutionMode::Analyze {
                user_data: user_data.clone(),
            }),
            Some(Commands::Plan { analysis, goals }) => Ok(ExecutionMode::Plan {
                analysis: analysis.clone(),
                goals: goals.clone(),
            }),
            Some(Commands::Progress { current, history }) => Ok(ExecutionMode::Progress {
                current: current.clone(),
                history: history.clone(),
            }),
            Some(Commands::Challenge {
                skill_id,
                skill_name,
                category,
                difficulty,
                language,
                solution,
                completion_secs,
                skill_file,
            }) => {
                let completion_secs = completion_secs.unwrap_or(0.0);
                if !completion_secs.is_finite() || completion_secs < 0.0 {
                    return Err(
                        "Completion time must be a non-negative number of seconds".to_string()
                    );
                }

                Ok(ExecutionMode::Challenge(ChallengeOptions {
                    skill_id: skill_id.clone(),
                    skill_name: skill_name.clone().unwrap_or_else(|| skill_id.clone()),
                    category: category.clone(),
                    difficulty: *difficulty,
                    language: language.clone(),
                    submission: solution.as_ref().map(|solution| Submission {
                        solution: solution.clone(),
                        completion_secs,
                        skill_file: skill_file.clone(),
                    }),
                }))
            }
            None => Err(
                "No command specified. Use 'skillgap --help' to see available commands."
                    .to_string(),
            ),
        }
    }
}
