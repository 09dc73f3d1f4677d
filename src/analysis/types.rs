use crate::env;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Connection and policy settings for one [`AnalysisClient`](super::AnalysisClient).
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ServiceConfig {
    pub api_endpoint: String,
    pub api_key: String,
    pub rate_limit_per_hour: u32,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub privacy_level: PrivacyLevel,
}

/// Partial update applied through
/// [`AnalysisClient::update_config`](super::AnalysisClient::update_config).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfigUpdate {
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub rate_limit_per_hour: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub privacy_level: Option<PrivacyLevel>,
}

/// Ordered from least to most restrictive.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyLevel {
    Basic,
    #[default]
    Enhanced,
    Maximum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    /// Remote 429 responses are retried from this budget, separately from
    /// the attempt ceiling used for timeouts and server errors.
    pub max_rate_limit_retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub response_time_ms: u64,
    pub rate_limit_remaining: u32,
    pub rate_limit_reset_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateLimitOrigin {
    /// Refused by the in-process hourly window
    Local,
    /// 429 returned by the analysis service
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authentication,
    RateLimit,
    Timeout,
    Network,
    Server,
    Http,
    Decode,
    MaxRetriesExceeded,
    NotConfigured,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        message: String,
        retry_after_secs: u64,
        origin: RateLimitOrigin,
    },
    #[error("Request timeout: {0}")]
    Timeout(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    #[error("HTTP error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Request failed after {attempts} attempts: {last}")]
    MaxRetriesExceeded {
        attempts: u32,
        last: Box<ServiceError>,
    },
    #[error("Analysis service not configured: {0}")]
    NotConfigured(String),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Authentication(_) => ErrorKind::Authentication,
            ServiceError::RateLimit { .. } => ErrorKind::RateLimit,
            ServiceError::Timeout(_) => ErrorKind::Timeout,
            ServiceError::Network(_) => ErrorKind::Network,
            ServiceError::Server { .. } => ErrorKind::Server,
            ServiceError::Http { .. } => ErrorKind::Http,
            ServiceError::Decode(_) => ErrorKind::Decode,
            ServiceError::MaxRetriesExceeded { .. } => ErrorKind::MaxRetriesExceeded,
            ServiceError::NotConfigured(_) => ErrorKind::NotConfigured,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Seconds to wait before retrying, for rate-limit errors.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            ServiceError::RateLimit {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        }
    }

    /// HTTP status associated with the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ServiceError::Validation(_) => Some(400),
            ServiceError::Authentication(_) => Some(401),
            ServiceError::RateLimit { .. } => Some(429),
            ServiceError::Timeout(_) => Some(408),
            ServiceError::Server { status, .. } | ServiceError::Http { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl ErrorKind {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimit
                | ErrorKind::Timeout
                | ErrorKind::Network
                | ErrorKind::Server
                | ErrorKind::Decode
        )
    }

    /// Stable code for diagnostics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::Authentication => "AUTHENTICATION_FAILED",
            ErrorKind::RateLimit => "RATE_LIMIT_EXCEEDED",
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::Network => "NETWORK_ERROR",
            ErrorKind::Server => "SERVER_ERROR",
            ErrorKind::Http => "HTTP_ERROR",
            ErrorKind::Decode => "DECODE_ERROR",
            ErrorKind::MaxRetriesExceeded => "MAX_RETRIES_EXCEEDED",
            ErrorKind::NotConfigured => "NOT_CONFIGURED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ServiceConfig {
    pub fn new(api_endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_endpoint: api_endpoint.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Every constraint violation, empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.api_endpoint.trim().is_empty() {
            errors.push("API endpoint is required".to_string());
        } else if url::Url::parse(&self.api_endpoint).is_err() {
            errors.push("API endpoint must be a valid URL".to_string());
        }

        if self.api_key.is_empty() {
            errors.push("API key is required".to_string());
        } else if self.api_key.len() < 10 {
            errors.push("API key appears to be too short".to_string());
        }

        if !(1..=10_000).contains(&self.rate_limit_per_hour) {
            errors.push("Rate limit must be between 1 and 10000 requests per hour".to_string());
        }

        if !(5..=300).contains(&self.timeout_secs) {
            errors.push("Timeout must be between 5 and 300 seconds".to_string());
        }

        if self.retry_attempts > 10 {
            errors.push("Retry attempts must be between 0 and 10".to_string());
        }

        errors
    }

    pub fn ensure_valid(&self) -> Result<(), ServiceError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(errors.join("; ")))
        }
    }

    pub fn apply(&mut self, update: ServiceConfigUpdate) {
        if let Some(endpoint) = update.api_endpoint {
            self.api_endpoint = endpoint;
        }
        if let Some(key) = update.api_key {
            self.api_key = key;
        }
        if let Some(rate) = update.rate_limit_per_hour {
            self.rate_limit_per_hour = rate;
        }
        if let Some(timeout) = update.timeout_secs {
            self.timeout_secs = timeout;
        }
        if let Some(retries) = update.retry_attempts {
            self.retry_attempts = retries;
        }
        if let Some(level) = update.privacy_level {
            self.privacy_level = level;
        }
    }

    /// Copy safe for display and logs.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.api_key.is_empty() {
            let visible: String = copy.api_key.chars().take(4).collect();
            copy.api_key = format!("{visible}****");
        }
        copy
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_key", &"<redacted>")
            .field("rate_limit_per_hour", &self.rate_limit_per_hour)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry_attempts", &self.retry_attempts)
            .field("privacy_level", &self.privacy_level)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_endpoint: env::defaults::API_ENDPOINT.to_string(),
            api_key: String::new(),
            rate_limit_per_hour: env::defaults::RATE_LIMIT_PER_HOUR,
            timeout_secs: env::defaults::TIMEOUT_SECS,
            retry_attempts: env::defaults::RETRY_ATTEMPTS,
            privacy_level: PrivacyLevel::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            max_rate_limit_retries: 5,
        }
    }
}

impl PrivacyLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            PrivacyLevel::Basic => "basic",
            PrivacyLevel::Enhanced => "enhanced",
            PrivacyLevel::Maximum => "maximum",
        }
    }
}

impl fmt::Display for PrivacyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrivacyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(PrivacyLevel::Basic),
            "enhanced" => Ok(PrivacyLevel::Enhanced),
            "maximum" => Ok(PrivacyLevel::Maximum),
            other => Err(format!(
                "Data privacy level must be one of: basic, enhanced, maximum (got '{other}')"
            )),
        }
    }
}
