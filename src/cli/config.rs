//! Configuration discovery and loading
//!
//! The analysis service configuration is resolved from an ordered list of
//! sources, first hit wins:
//! 1. Environment: `AI_SERVICE_API_ENDPOINT` + `AI_SERVICE_API_KEY` (plus optional tuning keys)
//! 2. Persisted file: ./.skillgap/config.toml, then ~/.skillgap/config.toml
//!
//! The persisted tier stores the API key obfuscated, not encrypted. Treat it
//! as lower trust than the environment.

use crate::analysis::{AnalysisClient, PrivacyLevel, ServiceConfig};
use crate::env::{self, vars};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use std::collections::HashMap;
use std::env as std_env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Analysis service not configured: set {} and {} or run `skillgap save-config`",
        vars::API_ENDPOINT,
        vars::API_KEY
    )]
    NotConfigured,
    #[error("Failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

/// Where a resolved configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Environment,
    File(PathBuf),
}

impl fmt::Display for ConfigOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigOrigin::Environment => f.write_str("environment"),
            ConfigOrigin::File(path) => write!(f, "file {}", path.display()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub config: ServiceConfig,
    pub origin: ConfigOrigin,
}

/// One tier of the configuration hierarchy.
pub trait ConfigSource: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when this tier has nothing to offer.
    fn load(&self) -> Result<Option<ResolvedConfig>, ConfigError>;
}

/// Reads `AI_SERVICE_*` variables, from the process or from an injected map.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigSource {
    overrides: Option<HashMap<String, String>>,
}

impl EnvConfigSource {
    pub fn from_process() -> Self {
        Self { overrides: None }
    }

    pub fn with_vars(vars: HashMap<String, String>) -> Self {
        Self {
            overrides: Some(vars),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        let value = match &self.overrides {
            Some(map) => map.get(key).cloned(),
            None => std_env::var(key).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                key: key.to_string(),
                message: e.to_string(),
            }),
            None => Ok(default),
        }
    }
}

impl ConfigSource for EnvConfigSource {
    fn name(&self) -> &str {
        "environment"
    }

    fn load(&self) -> Result<Option<ResolvedConfig>, ConfigError> {
        let (Some(api_endpoint), Some(api_key)) =
            (self.get(vars::API_ENDPOINT), self.get(vars::API_KEY))
        else {
            debug!("Endpoint or key missing from environment");
            return Ok(None);
        };

        let config = ServiceConfig {
            api_endpoint,
            api_key,
            rate_limit_per_hour: self
                .parse_or(vars::RATE_LIMIT, env::defaults::RATE_LIMIT_PER_HOUR)?,
            timeout_secs: self.parse_or(vars::TIMEOUT, env::defaults::TIMEOUT_SECS)?,
            retry_attempts: self.parse_or(vars::RETRY_ATTEMPTS, env::defaults::RETRY_ATTEMPTS)?,
            privacy_level: self.parse_or(vars::PRIVACY_LEVEL, PrivacyLevel::default())?,
        };

        Ok(Some(ResolvedConfig {
            config,
            origin: ConfigOrigin::Environment,
        }))
    }
}

/// TOML file tier. Reads the first existing candidate; saves to a fixed path.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    candidates: Vec<PathBuf>,
    save_path: PathBuf,
}

impl FileConfigSource {
    /// Single file used for both reading and saving.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            candidates: vec![path.clone()],
            save_path: path,
        }
    }

    /// Local `./.skillgap/config.toml` first, then the user's home. Saves go
    /// to the home directory when one is known.
    pub fn discover() -> Self {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(env::local_config_file_path(&current_dir));
        }
        let user_path = home_dir().map(|home| env::user_config_file_path(&home));
        if let Some(path) = &user_path {
            candidates.push(path.clone());
        }

        let save_path = user_path
            .or_else(|| candidates.first().cloned())
            .unwrap_or_else(|| env::local_config_file_path(Path::new(".")));

        Self {
            candidates,
            save_path,
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    pub fn find_config_file(&self) -> Option<&PathBuf> {
        self.candidates.iter().find(|candidate| {
            debug!("Checking for config file: {:?}", candidate);
            candidate.is_file()
        })
    }

    pub fn read(path: &Path) -> Result<ServiceConfig, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ServiceConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if !config.api_key.is_empty() {
            config.api_key =
                reveal_api_key(&config.api_key).ok_or_else(|| ConfigError::Parse {
                    path: path.to_path_buf(),
                    message: "stored API key is not valid base64".to_string(),
                })?;
        }
        Ok(config)
    }

    /// Writes `config` to the save path, creating the directory if needed.
    pub fn save(&self, config: &ServiceConfig) -> Result<PathBuf, ConfigError> {
        let path = &self.save_path;
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            info!("Created configuration directory: {:?}", dir);
        }

        let mut stored = config.clone();
        stored.api_key = obscure_api_key(&config.api_key);
        let content = toml::to_string_pretty(&stored).map_err(|e| {
            ConfigError::Parse {
                path: path.clone(),
                message: e.to_string(),
            }
        })?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        info!("Saved configuration to {:?}", path);
        Ok(path.clone())
    }

    /// Removes the saved file. Returns whether there was one.
    pub fn clear(&self) -> Result<bool, ConfigError> {
        if !self.save_path.exists() {
            return Ok(false);
        }
        fs::remove_file(&self.save_path).map_err(|source| ConfigError::Io {
            path: self.save_path.clone(),
            source,
        })?;
        info!("Removed configuration file {:?}", self.save_path);
        Ok(true)
    }
}

impl ConfigSource for FileConfigSource {
    fn name(&self) -> &str {
        "file"
    }

    fn load(&self) -> Result<Option<ResolvedConfig>, ConfigError> {
        let Some(path) = self.find_config_file() else {
            return Ok(None);
        };
        let config = Self::read(path)?;
        Ok(Some(ResolvedConfig {
            config,
            origin: ConfigOrigin::File(path.clone()),
        }))
    }
}

/// Tries each source in priority order.
pub struct ConfigResolver {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigResolver {
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }

    /// Process environment, then the discovered config file.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(EnvConfigSource::from_process()),
            Box::new(FileConfigSource::discover()),
        ])
    }

    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        for source in &self.sources {
            if let Some(resolved) = source.load()? {
                info!("Loaded analysis service configuration from {}", resolved.origin);
                let problems = resolved.config.validate();
                if !problems.is_empty() {
                    warn!(
                        source = source.name(),
                        "Configuration has problems: {}",
                        problems.join("; ")
                    );
                }
                return Ok(resolved);
            }
            debug!(source = source.name(), "No configuration in source");
        }
        Err(ConfigError::NotConfigured)
    }
}

/// Defaults for a new configuration; the key is left empty.
pub fn default_config_template() -> ServiceConfig {
    ServiceConfig::default()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time_ms: Option<u64>,
}

/// Builds a throwaway client for `config` and probes the service.
pub async fn test_config(config: &ServiceConfig) -> ConnectionReport {
    match AnalysisClient::new(config.clone()) {
        Ok(client) => test_connection(&client).await,
        Err(e) => ConnectionReport {
            success: false,
            error: Some(e.to_string()),
            response_time_ms: None,
        },
    }
}

pub async fn test_connection(client: &AnalysisClient) -> ConnectionReport {
    let started = Instant::now();
    match client.validate_connection().await {
        Ok(success) => ConnectionReport {
            success,
            error: None,
            response_time_ms: Some(started.elapsed().as_millis() as u64),
        },
        Err(e) => ConnectionReport {
            success: false,
            error: Some(e.to_string()),
            response_time_ms: None,
        },
    }
}

/// Show configuration discovery information for debugging
pub fn show_discovery_info(files: &FileConfigSource) {
    println!("Configuration Discovery Hierarchy:");
    println!();

    for name in vars::ALL {
        let status = if std_env::var(name).is_ok() {
            "✓ SET"
        } else {
            "✗ NOT SET"
        };
        println!("  env {name} - {status}");
    }

    for (i, candidate) in files.candidates().iter().enumerate() {
        let status = if candidate.exists() {
            if candidate.is_file() {
                "✓ EXISTS"
            } else {
                "✗ NOT A FILE"
            }
        } else {
            "✗ NOT FOUND"
        };

        println!("  {}. {:?} - {}", i + 1, candidate, status);
    }
    println!();
}

fn home_dir() -> Option<PathBuf> {
    std_env::var("HOME")
        .ok()
        .or_else(|| std_env::var("USERPROFILE").ok())
        .map(PathBuf::from)
}

fn obscure_api_key(key: &str) -> String {
    let reversed: String = key.chars().rev().collect();
    BASE64.encode(reversed)
}

fn reveal_api_key(stored: &str) -> Option<String> {
    let bytes = BASE64.decode(stored.trim()).ok()?;
    let reversed = String::from_utf8(bytes).ok()?;
    Some(reversed.chars().rev().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ApiResponse, RateLimiter, ScriptedTransport, TransportError};
    use serde_json::json;
    use serial_test::serial;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn env_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn sample_config() -> ServiceConfig {
        ServiceConfig {
            rate_limit_per_hour: 250,
            privacy_level: PrivacyLevel::Maximum,
            ..ServiceConfig::new(env::test::TEST_ENDPOINT, env::test::TEST_API_KEY)
        }
    }

    #[test]
    fn test_env_source_applies_defaults() {
        let source = EnvConfigSource::with_vars(env_map(&[
            (vars::API_ENDPOINT, env::test::TEST_ENDPOINT),
            (vars::API_KEY, env::test::TEST_API_KEY),
        ]));

        let resolved = source.load().unwrap().unwrap();
        assert_eq!(resolved.origin, ConfigOrigin::Environment);
        assert_eq!(resolved.config.rate_limit_per_hour, 100);
        assert_eq!(resolved.config.timeout_secs, 30);
        assert_eq!(resolved.config.retry_attempts, 3);
        assert_eq!(resolved.config.privacy_level, PrivacyLevel::Enhanced);
    }

    #[test]
    fn test_env_source_reads_tuning_keys() {
        let source = EnvConfigSource::with_vars(env_map(&[
            (vars::API_ENDPOINT, env::test::TEST_ENDPOINT),
            (vars::API_KEY, env::test::TEST_API_KEY),
            (vars::RATE_LIMIT, "500"),
            (vars::TIMEOUT, " 60 "),
            (vars::RETRY_ATTEMPTS, "0"),
            (vars::PRIVACY_LEVEL, "Basic"),
        ]));

        let config = source.load().unwrap().unwrap().config;
        assert_eq!(config.rate_limit_per_hour, 500);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.retry_attempts, 0);
        assert_eq!(config.privacy_level, PrivacyLevel::Basic);
    }

    #[test]
    fn test_env_source_requires_endpoint_and_key() {
        let only_key = EnvConfigSource::with_vars(env_map(&[(vars::API_KEY, "abc")]));
        assert!(only_key.load().unwrap().is_none());

        let blank_endpoint = EnvConfigSource::with_vars(env_map(&[
            (vars::API_ENDPOINT, "  "),
            (vars::API_KEY, env::test::TEST_API_KEY),
        ]));
        assert!(blank_endpoint.load().unwrap().is_none());
    }

    #[test]
    fn test_env_source_rejects_bad_values() {
        let source = EnvConfigSource::with_vars(env_map(&[
            (vars::API_ENDPOINT, env::test::TEST_ENDPOINT),
            (vars::API_KEY, env::test::TEST_API_KEY),
            (vars::RATE_LIMIT, "lots"),
        ]));
        let err = source.load().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == vars::RATE_LIMIT));

        let source = EnvConfigSource::with_vars(env_map(&[
            (vars::API_ENDPOINT, env::test::TEST_ENDPOINT),
            (vars::API_KEY, env::test::TEST_API_KEY),
            (vars::PRIVACY_LEVEL, "paranoid"),
        ]));
        let err = source.load().unwrap_err();
        assert!(err.to_string().contains("basic, enhanced, maximum"));
    }

    #[test]
    fn test_file_round_trip_obscures_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = env::local_config_file_path(temp_dir.path());
        let source = FileConfigSource::at(&path);

        let saved = source.save(&sample_config()).unwrap();
        assert_eq!(saved, path);

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains(env::test::TEST_API_KEY));
        assert!(raw.contains(&obscure_api_key(env::test::TEST_API_KEY)));

        let resolved = source.load().unwrap().unwrap();
        assert_eq!(resolved.config, sample_config());
        assert_eq!(resolved.origin, ConfigOrigin::File(path));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(
            &path,
            format!(
                "api_endpoint = \"{}\"\napi_key = \"{}\"\n",
                env::test::TEST_ENDPOINT,
                obscure_api_key(env::test::TEST_API_KEY)
            ),
        )
        .unwrap();

        let config = FileConfigSource::read(&path).unwrap();
        assert_eq!(config.api_key, env::test::TEST_API_KEY);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.privacy_level, PrivacyLevel::Enhanced);
    }

    #[test]
    fn test_corrupt_file_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "api_key = [not toml").unwrap();
        assert!(matches!(
            FileConfigSource::read(&path),
            Err(ConfigError::Parse { .. })
        ));

        fs::write(&path, "api_key = \"%%%\"").unwrap();
        let err = FileConfigSource::read(&path).unwrap_err();
        assert!(err.to_string().contains("not valid base64"));
    }

    #[test]
    fn test_clear_removes_saved_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = FileConfigSource::at(temp_dir.path().join(".skillgap").join("config.toml"));

        assert!(!source.clear().unwrap());
        source.save(&sample_config()).unwrap();
        assert!(source.clear().unwrap());
        assert!(source.load().unwrap().is_none());
    }

    #[test]
    fn test_file_candidates_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let first = temp_dir.path().join("first.toml");
        let second = temp_dir.path().join("second.toml");
        let source = FileConfigSource {
            candidates: vec![first.clone(), second.clone()],
            save_path: second.clone(),
        };

        source.save(&sample_config()).unwrap();
        assert_eq!(source.find_config_file(), Some(&second));

        FileConfigSource::at(&first)
            .save(&ServiceConfig::new("https://first.test", env::test::TEST_API_KEY))
            .unwrap();
        let resolved = source.load().unwrap().unwrap();
        assert_eq!(resolved.config.api_endpoint, "https://first.test");
    }

    #[test]
    fn test_resolver_prefers_environment() {
        let temp_dir = TempDir::new().unwrap();
        let file = FileConfigSource::at(temp_dir.path().join("config.toml"));
        file.save(&sample_config()).unwrap();

        let resolver = ConfigResolver::new(vec![
            Box::new(EnvConfigSource::with_vars(env_map(&[
                (vars::API_ENDPOINT, "https://env.test/v1"),
                (vars::API_KEY, env::test::TEST_API_KEY),
            ]))),
            Box::new(file.clone()),
        ]);
        let resolved = resolver.resolve().unwrap();
        assert_eq!(resolved.origin, ConfigOrigin::Environment);
        assert_eq!(resolved.config.api_endpoint, "https://env.test/v1");

        let resolver = ConfigResolver::new(vec![
            Box::new(EnvConfigSource::with_vars(HashMap::new())),
            Box::new(file),
        ]);
        let resolved = resolver.resolve().unwrap();
        assert!(matches!(resolved.origin, ConfigOrigin::File(_)));
        assert_eq!(resolved.config.rate_limit_per_hour, 250);
    }

    #[test]
    fn test_resolver_not_configured() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(vec![
            Box::new(EnvConfigSource::with_vars(HashMap::new())),
            Box::new(FileConfigSource::at(temp_dir.path().join("missing.toml"))),
        ]);
        let err = resolver.resolve().unwrap_err();
        assert!(matches!(err, ConfigError::NotConfigured));
        assert!(err.to_string().contains(vars::API_KEY));
    }

    #[test]
    #[serial]
    fn test_process_environment_source() {
        // SAFETY: serialized with every other test that touches the environment
        unsafe {
            std_env::set_var(vars::API_ENDPOINT, env::test::TEST_ENDPOINT);
            std_env::set_var(vars::API_KEY, env::test::TEST_API_KEY);
            std_env::set_var(vars::TIMEOUT, "45");
        }

        let resolved = EnvConfigSource::from_process().load();

        unsafe {
            for name in vars::ALL {
                std_env::remove_var(name);
            }
        }

        let config = resolved.unwrap().unwrap().config;
        assert_eq!(config.api_endpoint, env::test::TEST_ENDPOINT);
        assert_eq!(config.timeout_secs, 45);
    }

    #[test]
    fn test_default_template() {
        let template = default_config_template();
        assert_eq!(template.api_endpoint, "https://api.example.com/v1");
        assert_eq!(template.rate_limit_per_hour, 100);
        assert!(template.api_key.is_empty());
        assert!(template.validate().contains(&"API key is required".to_string()));
    }

    #[tokio::test]
    async fn test_connection_report() {
        let config = ServiceConfig::new(env::test::TEST_ENDPOINT, env::test::TEST_API_KEY);
        let transport = Arc::new(
            ScriptedTransport::new().reply(ApiResponse::json(200, &json!({"status": "ok"}))),
        );
        let client = AnalysisClient::with_transport(
            config.clone(),
            transport,
            RateLimiter::new(config.rate_limit_per_hour),
        )
        .unwrap();

        let report = test_connection(&client).await;
        assert!(report.success);
        assert!(report.error.is_none());
        assert!(report.response_time_ms.is_some());

        let transport = Arc::new(
            ScriptedTransport::new().reply(ApiResponse::json(401, &json!({"message": "bad key"}))),
        );
        let client = AnalysisClient::with_transport(
            config.clone(),
            transport,
            RateLimiter::new(config.rate_limit_per_hour),
        )
        .unwrap();
        let report = test_connection(&client).await;
        assert!(!report.success);
        assert!(report.error.unwrap().contains("bad key"));

        let transport = Arc::new(
            ScriptedTransport::new().fail(TransportError::Network("refused".to_string())),
        );
        let client = AnalysisClient::with_transport(
            ServiceConfig {
                retry_attempts: 0,
                ..config.clone()
            },
            transport,
            RateLimiter::new(config.rate_limit_per_hour),
        )
        .unwrap();
        let report = test_connection(&client).await;
        assert!(!report.success);
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_invalid_config_reports_error() {
        let report = test_config(&ServiceConfig::new("not a url", "short")).await;
        assert!(!report.success);
        let error = report.error.unwrap();
        assert!(error.contains("API endpoint must be a valid URL"));
        assert!(error.contains("API key appears to be too short"));
    }
}
