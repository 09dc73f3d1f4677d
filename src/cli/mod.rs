//! CLI-specific functionality for skillgap
//!
//! This module contains the argument parsing and the analysis service
//! configuration discovery used by the `skillgap` binary.

pub mod args;
pub mod config;

pub use args::{Args, ChallengeOptions, Commands, ExecutionMode, SaveConfigOptions, Submission};
pub use config::{
    ConfigError, ConfigOrigin, ConfigResolver, ConfigSource, ConnectionReport, EnvConfigSource,
    FileConfigSource, ResolvedConfig, default_config_template, show_discovery_info, test_config,
    test_connection,
};
