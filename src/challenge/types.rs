use crate::profile::{SkillId, ValidationRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type ChallengeId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Scales how strongly a result moves confidence.
    pub fn multiplier(self) -> f64 {
        match self {
            Difficulty::Beginner => 0.5,
            Difficulty::Intermediate => 1.0,
            Difficulty::Advanced => 1.5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
    pub is_hidden: bool,
    pub weight: f64,
}

impl TestCase {
    pub fn visible(input: &str, expected_output: &str) -> Self {
        Self {
            input: input.to_string(),
            expected_output: expected_output.to_string(),
            is_hidden: false,
            weight: 1.0,
        }
    }

    pub fn hidden(input: &str, expected_output: &str) -> Self {
        Self {
            is_hidden: true,
            ..Self::visible(input, expected_output)
        }
    }

    pub fn weighted(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeTemplate {
    pub category: String,
    pub difficulty: Difficulty,
    pub language: String,
    /// `{skill}` is replaced by the skill name
    pub title_pattern: String,
    pub prompt: String,
    pub expected_output: String,
    pub time_limit_minutes: u32,
    pub test_cases: Vec<TestCase>,
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub id: ChallengeId,
    pub skill_id: SkillId,
    pub title: String,
    pub difficulty: Difficulty,
    pub prompt: String,
    pub expected_output: String,
    pub time_limit_minutes: u32,
    pub language: String,
    pub test_cases: Vec<TestCase>,
    pub hints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResult {
    pub challenge_id: ChallengeId,
    pub skill_id: SkillId,
    pub score: f64,
    pub completion_time_secs: f64,
    pub passed_tests: usize,
    pub total_tests: usize,
    pub feedback: String,
    pub confidence_adjustment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub original_level: f64,
    pub adjusted_level: f64,
    pub confidence_score: f64,
    pub validation_record: ValidationRecord,
    pub recommendations: Vec<String>,
}

/// Outcome of running one test case.
#[derive(Debug, Clone, PartialEq)]
pub struct TestOutcome {
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestRun {
    pub outcomes: Vec<TestOutcome>,
}

impl TestRun {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.outcomes.iter().map(|o| o.weight).sum()
    }

    pub fn passed_weight(&self) -> f64 {
        self.outcomes.iter().filter(|o| o.passed).map(|o| o.weight).sum()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ChallengeError {
    #[error("Challenge {0} not found")]
    NotFound(ChallengeId),
    #[error("No challenge template found for {category} at {difficulty} level")]
    NoTemplate {
        category: String,
        difficulty: Difficulty,
    },
}
