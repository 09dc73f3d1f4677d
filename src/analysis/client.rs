//! Client for the remote skill analysis service.
//!
//! Every remote call goes through [`AnalysisClient::dispatch`], which applies,
//! in order:
//!
//! 1. the shared hourly [`RateLimiter`] (refusal is immediate),
//! 2. a hard per-attempt deadline equal to the configured timeout,
//! 3. the retry loop: non-retryable kinds abort, remote 429s wait for the
//!    advertised `Retry-After` and draw from their own budget, timeouts and
//!    server/network errors back off per [`RetryPolicy`] until the attempt
//!    ceiling is reached.
//!
//! The rate window is only charged once the call succeeds.

use crate::analysis::anonymizer::DataAnonymizer;
use crate::analysis::rate_limiter::{RateLimiter, RateLimiterStatus};
use crate::analysis::retry::RetryPolicy;
use crate::analysis::transport::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, Transport, TransportError,
};
use crate::analysis::types::*;
use crate::env;
use crate::profile::{
    AnalysisResult, CareerGoals, CareerRecommendation, MarketInsights, PersonalizedPlan,
    PlanRecommendation, ProgressReport, SkillGap, SkillStrength, UserSkillData,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

const HEALTHY_RESPONSE_MS: u64 = 2000;

pub struct AnalysisClient {
    config: ServiceConfig,
    client_id: String,
    transport: Arc<dyn Transport>,
    rate_limiter: RateLimiter,
    retry_policy: RetryPolicy,
}

impl std::fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("config", &self.config)
            .field("client_id", &self.client_id)
            .field("rate_limiter", &self.rate_limiter)
            .field("retry_policy", &self.retry_policy)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnalysisPayload {
    strengths: Option<Vec<SkillStrength>>,
    weaknesses: Option<Vec<SkillGap>>,
    market_insights: Option<MarketInsights>,
    career_recommendations: Option<Vec<CareerRecommendation>>,
    confidence_level: Option<f64>,
    data_sources_used: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PlanPayload {
    id: Option<String>,
    recommendations: Option<Vec<PlanRecommendation>>,
    estimated_timeframe: Option<String>,
    priority_level: Option<String>,
    target_skills: Option<Vec<String>>,
    success_metrics: Option<Vec<String>>,
}

impl AnalysisClient {
    /// Client talking HTTP to `config.api_endpoint`, with its own rate window.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let transport = HttpTransport::new(config.timeout())
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        let rate_limiter = RateLimiter::new(config.rate_limit_per_hour);
        Self::with_transport(config, Arc::new(transport), rate_limiter)
    }

    /// Client over an arbitrary transport. Pass a clone of an existing
    /// [`RateLimiter`] to make several clients share one quota.
    pub fn with_transport(
        config: ServiceConfig,
        transport: Arc<dyn Transport>,
        rate_limiter: RateLimiter,
    ) -> Result<Self, ServiceError> {
        config.ensure_valid()?;
        rate_limiter.set_max_requests(config.rate_limit_per_hour);
        let retry_policy = RetryPolicy::new(config.retry_attempts, RetryConfig::default());

        Ok(Self {
            config,
            client_id: format!("skillgap-{}", Uuid::new_v4()),
            transport,
            rate_limiter,
            retry_policy,
        })
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_policy = RetryPolicy::new(self.config.retry_attempts, retry_config);
        self
    }

    /// Copy of the active configuration.
    pub fn config(&self) -> ServiceConfig {
        self.config.clone()
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    pub fn rate_limit_status(&self) -> RateLimiterStatus {
        self.rate_limiter.status()
    }

    /// Apply a partial update. The result is validated as a whole; on error
    /// the current configuration is kept.
    pub fn update_config(&mut self, update: ServiceConfigUpdate) -> Result<(), ServiceError> {
        let mut candidate = self.config.clone();
        candidate.apply(update);
        candidate.ensure_valid()?;

        if candidate.rate_limit_per_hour != self.config.rate_limit_per_hour {
            info!(
                from = self.config.rate_limit_per_hour,
                to = candidate.rate_limit_per_hour,
                "Updating hourly rate limit"
            );
            self.rate_limiter
                .set_max_requests(candidate.rate_limit_per_hour);
        }
        if candidate.retry_attempts != self.config.retry_attempts {
            self.retry_policy =
                RetryPolicy::new(candidate.retry_attempts, self.retry_policy.config().clone());
        }

        self.config = candidate;
        Ok(())
    }

    /// `true` when the service reports `{"status": "ok"}`. Authentication
    /// failures are returned as errors; anything else reads as `false`.
    pub async fn validate_connection(&self) -> Result<bool, ServiceError> {
        match self.dispatch(HttpMethod::Get, env::api::HEALTH_PATH, None).await {
            Ok(body) => Ok(body.get("status").and_then(Value::as_str) == Some("ok")),
            Err(error @ ServiceError::Authentication(_)) => Err(error),
            Err(error) => {
                warn!(kind = %error.kind(), "Connection check failed: {}", error);
                Ok(false)
            }
        }
    }

    pub async fn analyze_skills(
        &self,
        user_data: &UserSkillData,
    ) -> Result<AnalysisResult, ServiceError> {
        validate_user_data(user_data)?;

        let anonymized = DataAnonymizer::anonymize(user_data, self.config.privacy_level);
        debug!(
            privacy_level = %self.config.privacy_level,
            skills = anonymized.manual_skills.len(),
            "Submitting anonymized skill data for analysis"
        );

        let body = json!({
            "userData": anonymized,
            "analysisOptions": {
                "includeMarketInsights": true,
                "includeCareerRecommendations": true,
                "confidenceThreshold": 0.7,
            },
        });

        let response = self
            .dispatch(HttpMethod::Post, env::api::ANALYZE_SKILLS_PATH, Some(body))
            .await?;
        let payload: AnalysisPayload = decode(response)?;

        Ok(AnalysisResult {
            strengths: payload.strengths.unwrap_or_default(),
            weaknesses: payload.weaknesses.unwrap_or_default(),
            market_insights: payload.market_insights.unwrap_or_default(),
            career_recommendations: payload.career_recommendations.unwrap_or_default(),
            confidence_level: payload.confidence_level.unwrap_or(0.0),
            analysis_date: Utc::now(),
            data_sources_used: payload
                .data_sources_used
                .filter(|sources| !sources.is_empty())
                .unwrap_or_else(|| vec!["manual_input".to_string()]),
        })
    }

    /// Only derived analysis fields and the goals are sent; raw user data
    /// never is.
    pub async fn generate_improvement_plan(
        &self,
        analysis: &AnalysisResult,
        goals: &CareerGoals,
    ) -> Result<PersonalizedPlan, ServiceError> {
        if goals.target_role.trim().is_empty() {
            return Err(ServiceError::Validation(
                "Career goals must name a target role".to_string(),
            ));
        }

        let body = json!({
            "analysis": {
                "strengths": analysis.strengths,
                "weaknesses": analysis.weaknesses,
                "marketInsights": analysis.market_insights,
            },
            "careerGoals": goals,
            "planOptions": {
                "timeframe": goals.timeframe,
                "focusAreas": goals.priority_skills,
                "learningStyle": "mixed",
            },
        });

        let response = self
            .dispatch(HttpMethod::Post, env::api::GENERATE_PLAN_PATH, Some(body))
            .await?;
        let payload: PlanPayload = decode(response)?;
        let now = Utc::now();

        Ok(PersonalizedPlan {
            id: payload
                .id
                .unwrap_or_else(|| format!("plan_{}", now.timestamp_millis())),
            generated_date: now,
            recommendations: payload.recommendations.unwrap_or_default(),
            estimated_timeframe: payload
                .estimated_timeframe
                .unwrap_or_else(|| "6 months".to_string()),
            priority_level: payload
                .priority_level
                .unwrap_or_else(|| "medium".to_string()),
            customizations: Vec::new(),
            target_skills: payload.target_skills.unwrap_or_default(),
            success_metrics: payload.success_metrics.unwrap_or_default(),
        })
    }

    pub async fn track_progress(
        &self,
        current: &UserSkillData,
        history: &[AnalysisResult],
    ) -> Result<ProgressReport, ServiceError> {
        validate_skills(current)?;

        let anonymized = DataAnonymizer::anonymize(current, self.config.privacy_level);
        let historical: Vec<Value> = history
            .iter()
            .map(|analysis| {
                json!({
                    "date": analysis.analysis_date,
                    "strengths": analysis.strengths,
                    "weaknesses": analysis.weaknesses,
                    "confidenceLevel": analysis.confidence_level,
                })
            })
            .collect();

        let body = json!({
            "currentData": anonymized,
            "historicalAnalyses": historical,
        });

        let response = self
            .dispatch(HttpMethod::Post, env::api::TRACK_PROGRESS_PATH, Some(body))
            .await?;
        decode(response)
    }

    /// Never fails: any error during the check reads as `Unhealthy`.
    pub async fn get_service_health(&self) -> ServiceHealth {
        let started = Instant::now();
        let outcome = self.validate_connection().await;
        let response_time_ms = started.elapsed().as_millis() as u64;

        let status = match outcome {
            Ok(true) if response_time_ms < HEALTHY_RESPONSE_MS => HealthStatus::Healthy,
            Ok(true) => HealthStatus::Degraded,
            Ok(false) => HealthStatus::Unhealthy,
            Err(error) => {
                warn!("Health check failed: {}", error);
                HealthStatus::Unhealthy
            }
        };

        let rate = self.rate_limiter.status();
        ServiceHealth {
            status,
            response_time_ms,
            rate_limit_remaining: rate.remaining,
            rate_limit_reset_at: rate.reset_at,
        }
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ServiceError> {
        let permit = self.rate_limiter.admit()?;

        let request = ApiRequest {
            method,
            url: join_url(&self.config.api_endpoint, path),
            api_key: self.config.api_key.clone(),
            client_id: self.client_id.clone(),
            body,
        };

        let max_attempts = self.retry_policy.max_attempts();
        let mut attempt = 1;
        let mut rate_limit_retries = 0;

        let last_error = loop {
            debug!(path, attempt, max_attempts, "Dispatching analysis request");

            let error = match self.execute_once(request.clone()).await {
                Ok(value) => {
                    permit.record();
                    return Ok(value);
                }
                Err(error) => error,
            };

            if let Some(retry_after_secs) = error.retry_after_secs() {
                if rate_limit_retries >= self.retry_policy.max_rate_limit_retries() {
                    warn!(path, rate_limit_retries, "Rate limit retry budget exhausted");
                    break error;
                }
                rate_limit_retries += 1;
                warn!(
                    path,
                    retry_after_secs, rate_limit_retries, "Service rate limited the request"
                );
                tokio::time::sleep(Duration::from_secs(retry_after_secs)).await;
                continue;
            }

            if !error.is_retryable() {
                debug!(path, kind = %error.kind(), "Non-retryable error");
                return Err(error);
            }

            if attempt >= max_attempts {
                break error;
            }

            let delay = self.retry_policy.delay(attempt);
            warn!(
                path,
                attempt,
                delay_ms = delay.as_millis() as u64,
                kind = %error.kind(),
                "Request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        };

        Err(ServiceError::MaxRetriesExceeded {
            attempts: attempt,
            last: Box::new(last_error),
        })
    }

    async fn execute_once(&self, request: ApiRequest) -> Result<Value, ServiceError> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Err(_) => Err(ServiceError::Timeout(format!(
                "no response within {}s",
                timeout.as_secs()
            ))),
            Ok(Err(TransportError::Timeout)) => {
                Err(ServiceError::Timeout("transport timed out".to_string()))
            }
            Ok(Err(TransportError::Network(message))) => Err(ServiceError::Network(message)),
            Ok(Ok(response)) => classify_response(response),
        }
    }
}

/// Map a raw response onto the error taxonomy, or parse its JSON body.
pub fn classify_response(response: ApiResponse) -> Result<Value, ServiceError> {
    if response.is_success() {
        if response.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        return serde_json::from_str(&response.body)
            .map_err(|e| ServiceError::Decode(format!("invalid JSON body: {e}")));
    }

    let message = serde_json::from_str::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}: {}", response.status, response.reason));

    Err(match response.status {
        401 => ServiceError::Authentication(message),
        429 => ServiceError::RateLimit {
            message,
            retry_after_secs: response.retry_after_secs(),
            origin: RateLimitOrigin::Remote,
        },
        400 => ServiceError::Validation(message),
        500 | 502 | 503 | 504 => ServiceError::Server {
            status: response.status,
            message,
        },
        status => ServiceError::Http { status, message },
    })
}

fn decode<T: serde::de::DeserializeOwned + Default>(value: Value) -> Result<T, ServiceError> {
    if value.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn join_url(endpoint: &str, path: &str) -> String {
    format!("{}{}", endpoint.trim_end_matches('/'), path)
}

fn validate_user_data(data: &UserSkillData) -> Result<(), ServiceError> {
    validate_skills(data)?;
    if data.career_goals.is_none() {
        return Err(ServiceError::Validation(
            "Career goals are required".to_string(),
        ));
    }
    Ok(())
}

fn validate_skills(data: &UserSkillData) -> Result<(), ServiceError> {
    if data.manual_skills.is_empty() {
        return Err(ServiceError::Validation(
            "At least one skill is required".to_string(),
        ));
    }
    if let Some(skill) = data
        .manual_skills
        .iter()
        .find(|skill| !(0.0..=100.0).contains(&skill.self_assessed_level))
    {
        return Err(ServiceError::Validation(format!(
            "Invalid skill level for {}: must be between 0 and 100",
            skill.name
        )));
    }
    Ok(())
}
