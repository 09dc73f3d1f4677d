use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type SkillId = String;

/// Everything the caller knows about a user's skills.
///
/// Owned by the caller; anonymization always works on a deep copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSkillData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_details: Option<PersonalDetails>,
    #[serde(default)]
    pub manual_skills: Vec<UserSkill>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_analysis: Option<RepositoryAnalysis>,
    #[serde(default)]
    pub learning_platform_data: Vec<LearningPlatformRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub career_goals: Option<CareerGoals>,
    #[serde(default)]
    pub assessment_history: Vec<AssessmentRecord>,
}

/// Direct identifiers. Never leave the process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalDetails {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSkill {
    pub id: SkillId,
    pub name: String,
    pub category: String,
    /// Self-assessed proficiency, 0-100
    pub self_assessed_level: f64,
    /// 0-1
    #[serde(default = "default_confidence")]
    pub confidence_score: f64,
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub validation_history: Vec<ValidationRecord>,
}

fn default_confidence() -> f64 {
    0.3
}

impl UserSkill {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        level: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            self_assessed_level: level,
            confidence_score: default_confidence(),
            last_updated: Utc::now(),
            validation_history: Vec::new(),
        }
    }

    /// Append a validation outcome. History is append-only; earlier records are
    /// never touched.
    pub fn record_validation(&mut self, record: ValidationRecord, confidence_score: f64) {
        self.last_updated = record.date;
        self.validation_history.push(record);
        self.confidence_score = confidence_score;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMethod {
    Challenge,
    Assessment,
    Peer,
    Certification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRecord {
    pub date: DateTime<Utc>,
    pub method: ValidationMethod,
    /// 0-100
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Output of a repository-activity analysis (e.g. GitHub).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub languages: HashMap<String, u64>,
    #[serde(default)]
    pub repository_count: u32,
    #[serde(default)]
    pub contribution_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlatformRecord {
    pub platform: String,
    pub user_id: String,
    #[serde(default)]
    pub completed_courses: Vec<String>,
    #[serde(default)]
    pub certificates: Vec<String>,
    #[serde(default)]
    pub hours_spent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerGoals {
    pub target_role: String,
    #[serde(default)]
    pub timeframe: String,
    #[serde(default)]
    pub priority_skills: Vec<String>,
    #[serde(default)]
    pub preferred_industries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub skill_id: SkillId,
    pub score: f64,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillStrength {
    pub skill_name: String,
    pub level: f64,
    pub market_value: f64,
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillGap {
    pub skill_name: String,
    pub current_level: f64,
    pub target_level: f64,
    pub priority: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarketInsights {
    pub trending_skills: Vec<String>,
    pub demand_by_skill: HashMap<String, f64>,
    pub salary_impact: HashMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CareerRecommendation {
    pub title: String,
    pub match_score: f64,
    pub missing_skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub strengths: Vec<SkillStrength>,
    pub weaknesses: Vec<SkillGap>,
    pub market_insights: MarketInsights,
    pub career_recommendations: Vec<CareerRecommendation>,
    pub confidence_level: f64,
    pub analysis_date: DateTime<Utc>,
    pub data_sources_used: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanRecommendation {
    pub skill_name: String,
    pub action: String,
    pub resources: Vec<String>,
    pub estimated_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedPlan {
    pub id: String,
    pub generated_date: DateTime<Utc>,
    pub recommendations: Vec<PlanRecommendation>,
    pub estimated_timeframe: String,
    pub priority_level: String,
    pub customizations: Vec<String>,
    pub target_skills: Vec<String>,
    pub success_metrics: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressReport {
    pub progress_insights: Vec<String>,
    pub trend_analysis: Vec<SkillStrength>,
    pub next_milestones: Vec<String>,
}
