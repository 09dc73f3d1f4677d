//! Environment constants and path utilities for skillgap.
//!
//! This module centralizes the environment variable names, default values and
//! directory names used throughout the application, making them easier to
//! maintain and modify.

use std::path::{Path, PathBuf};

/// Main application directory name (hidden directory like .git, .vscode)
pub const SKILLGAP_DIR_NAME: &str = ".skillgap";

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable names for the analysis service configuration
pub mod vars {
    /// Prefix shared by every analysis service variable
    pub const PREFIX: &str = "AI_SERVICE_";

    pub const API_ENDPOINT: &str = "AI_SERVICE_API_ENDPOINT";
    pub const API_KEY: &str = "AI_SERVICE_API_KEY";
    pub const RATE_LIMIT: &str = "AI_SERVICE_RATE_LIMIT";
    pub const TIMEOUT: &str = "AI_SERVICE_TIMEOUT";
    pub const RETRY_ATTEMPTS: &str = "AI_SERVICE_RETRY_ATTEMPTS";
    pub const PRIVACY_LEVEL: &str = "AI_SERVICE_PRIVACY_LEVEL";

    /// All variables, in documentation order
    pub const ALL: [&str; 6] = [
        API_ENDPOINT,
        API_KEY,
        RATE_LIMIT,
        TIMEOUT,
        RETRY_ATTEMPTS,
        PRIVACY_LEVEL,
    ];
}

/// Defaults applied when a setting is not provided
pub mod defaults {
    pub const API_ENDPOINT: &str = "https://api.example.com/v1";
    pub const RATE_LIMIT_PER_HOUR: u32 = 100;
    pub const TIMEOUT_SECS: u64 = 30;
    pub const RETRY_ATTEMPTS: u32 = 3;
}

/// Remote analysis service paths and headers
pub mod api {
    pub const HEALTH_PATH: &str = "/health";
    pub const ANALYZE_SKILLS_PATH: &str = "/analyze/skills";
    pub const GENERATE_PLAN_PATH: &str = "/generate/plan";
    pub const TRACK_PROGRESS_PATH: &str = "/track/progress";

    pub const USER_AGENT: &str = "SkillGapAnalyzer/1.0";
    pub const CLIENT_ID_HEADER: &str = "X-Client-Id";

    /// Seconds to wait when a 429 carries no `Retry-After` header
    pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
}

/// Test-related constants
pub mod test {
    /// Endpoint used by tests that never reach the network
    pub const TEST_ENDPOINT: &str = "https://analysis.test/v1";

    /// Credential used by tests
    pub const TEST_API_KEY: &str = "test-api-key-0123456789";
}

/// Build the main .skillgap directory path from a base directory
pub fn skillgap_dir_path(base: &Path) -> PathBuf {
    base.join(SKILLGAP_DIR_NAME)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    skillgap_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    skillgap_dir_path(current_dir).join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_paths() {
        let home_dir = Path::new("/home/user");
        let current_dir = Path::new("/current/project");

        assert_eq!(
            user_config_file_path(home_dir),
            Path::new("/home/user/.skillgap/config.toml")
        );

        assert_eq!(
            local_config_file_path(current_dir),
            Path::new("/current/project/.skillgap/config.toml")
        );
    }

    #[test]
    fn test_env_var_names_share_prefix() {
        for name in vars::ALL {
            assert!(name.starts_with(vars::PREFIX), "{name} lacks prefix");
        }
    }
}
