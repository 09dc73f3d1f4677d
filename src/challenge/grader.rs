use crate::challenge::catalog::ChallengeCatalog;
use crate::challenge::executor::{CodeExecutor, SimulatedExecutor};
use crate::challenge::types::*;
use crate::profile::{UserSkill, ValidationMethod, ValidationRecord};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

const TEST_SCORE_WEIGHT: f64 = 70.0;
const TIME_BONUS_WEIGHT: f64 = 30.0;
const RECENT_VALIDATION_DAYS: i64 = 90;
const RECENCY_DECAY: f64 = 0.8;

/// Grades submissions against catalog challenges and turns scores into
/// skill-level and confidence updates.
pub struct ChallengeGrader {
    catalog: Arc<ChallengeCatalog>,
    executor: Arc<dyn CodeExecutor>,
}

impl ChallengeGrader {
    pub fn new(catalog: Arc<ChallengeCatalog>) -> Self {
        Self::with_executor(catalog, Arc::new(SimulatedExecutor::new()))
    }

    pub fn with_executor(catalog: Arc<ChallengeCatalog>, executor: Arc<dyn CodeExecutor>) -> Self {
        Self { catalog, executor }
    }

    pub fn catalog(&self) -> &Arc<ChallengeCatalog> {
        &self.catalog
    }

    /// Executor failures are recorded as failed cases, never propagated.
    pub fn run_test_cases(&self, code: &str, test_cases: &[TestCase], language: &str) -> TestRun {
        let outcomes = test_cases
            .iter()
            .map(|case| {
                let actual = match self.executor.execute(code, &case.input, language) {
                    Ok(output) => output,
                    Err(e) => {
                        warn!(input = %case.input, "Test case execution failed: {}", e);
                        format!("Error: {e}")
                    }
                };
                TestOutcome {
                    input: case.input.clone(),
                    expected: case.expected_output.clone(),
                    passed: actual == case.expected_output,
                    actual,
                    weight: case.weight,
                }
            })
            .collect();

        TestRun { outcomes }
    }

    pub fn validate_challenge(
        &self,
        challenge_id: &str,
        code: &str,
        completion_time_secs: f64,
    ) -> Result<ChallengeResult, ChallengeError> {
        let challenge = self
            .catalog
            .find_challenge(challenge_id)
            .ok_or_else(|| ChallengeError::NotFound(challenge_id.to_string()))?;

        let run = self.run_test_cases(code, &challenge.test_cases, &challenge.language);
        let score = calculate_score(&run, completion_time_secs, challenge.time_limit_minutes);
        let feedback = generate_feedback(&run, score, challenge.difficulty);
        let confidence_adjustment = confidence_adjustment(score, challenge.difficulty);

        info!(
            challenge_id,
            passed = run.passed(),
            total = run.total(),
            score,
            "Challenge graded"
        );

        Ok(ChallengeResult {
            challenge_id: challenge.id,
            skill_id: challenge.skill_id,
            score,
            completion_time_secs,
            passed_tests: run.passed(),
            total_tests: run.total(),
            feedback,
            confidence_adjustment,
        })
    }

    /// Computes the level and confidence a result implies without touching
    /// the skill. See [`apply_validation`](Self::apply_validation).
    pub fn process_validation_result(
        &self,
        skill: &UserSkill,
        result: &ChallengeResult,
    ) -> ValidationResult {
        let original_level = skill.self_assessed_level;
        let adjusted_level = adjusted_level(original_level, result);
        let confidence_score = updated_confidence(skill.confidence_score, result.score);

        let validation_record = ValidationRecord {
            date: Utc::now(),
            method: ValidationMethod::Challenge,
            score: result.score,
            feedback: Some(result.feedback.clone()),
        };

        debug!(
            skill_id = %skill.id,
            original_level,
            adjusted_level,
            confidence_score,
            "Processed validation result"
        );

        ValidationResult {
            original_level,
            adjusted_level,
            confidence_score,
            validation_record,
            recommendations: recommendations(result.score, adjusted_level, original_level),
        }
    }

    /// Processes the result and writes it back: the record is appended to the
    /// history and the skill takes the adjusted level and new confidence.
    pub fn apply_validation(
        &self,
        skill: &mut UserSkill,
        result: &ChallengeResult,
    ) -> ValidationResult {
        let validation = self.process_validation_result(skill, result);
        skill.self_assessed_level = validation.adjusted_level;
        skill.record_validation(validation.validation_record.clone(), validation.confidence_score);
        validation
    }
}

/// Confidence implied by a validation history, relative to now.
pub fn calculate_skill_confidence(history: &[ValidationRecord]) -> f64 {
    calculate_skill_confidence_at(history, Utc::now())
}

pub fn calculate_skill_confidence_at(history: &[ValidationRecord], now: DateTime<Utc>) -> f64 {
    if history.is_empty() {
        return 0.3;
    }

    let cutoff = now - ChronoDuration::days(RECENT_VALIDATION_DAYS);
    let mut recent: Vec<&ValidationRecord> = history.iter().filter(|r| r.date >= cutoff).collect();
    if recent.is_empty() {
        return 0.4;
    }
    recent.sort_by(|a, b| b.date.cmp(&a.date));

    let (weighted_score, total_weight) = recent.iter().enumerate().fold(
        (0.0, 0.0),
        |(score, weight), (i, record)| {
            let w = RECENCY_DECAY.powi(i as i32);
            (score + record.score * w, weight + w)
        },
    );

    let base = (weighted_score / total_weight / 100.0).min(1.0);
    let boost = (recent.len() as f64 * 0.1).min(0.3);
    (base + boost).min(1.0)
}

fn calculate_score(run: &TestRun, completion_time_secs: f64, time_limit_minutes: u32) -> f64 {
    let total_weight = run.total_weight();
    let test_score = if total_weight > 0.0 {
        run.passed_weight() / total_weight * TEST_SCORE_WEIGHT
    } else {
        0.0
    };

    let limit_secs = f64::from(time_limit_minutes) * 60.0;
    let time_ratio = if limit_secs > 0.0 {
        (completion_time_secs / limit_secs).min(1.0)
    } else {
        1.0
    };
    let time_bonus = ((1.0 - time_ratio) * TIME_BONUS_WEIGHT).max(0.0);

    (test_score + time_bonus).min(100.0)
}

fn generate_feedback(run: &TestRun, score: f64, difficulty: Difficulty) -> String {
    let passed = run.passed();
    let total = run.total();
    let pass_rate = if total > 0 {
        passed as f64 / total as f64 * 100.0
    } else {
        0.0
    };

    let mut feedback = format!("You passed {passed} out of {total} test cases ({pass_rate:.1}%). ");

    feedback.push_str(if score >= 90.0 {
        "Excellent work! Your solution demonstrates strong understanding of the concept."
    } else if score >= 70.0 {
        "Good job! Your solution works well with room for minor improvements."
    } else if score >= 50.0 {
        "Your solution shows basic understanding but needs improvement in edge cases or efficiency."
    } else {
        "Your solution needs significant improvement. Consider reviewing the fundamentals."
    });

    match difficulty {
        Difficulty::Advanced if score >= 60.0 => {
            feedback.push_str(" Tackling advanced challenges shows strong problem-solving skills.")
        }
        Difficulty::Beginner if score < 70.0 => feedback.push_str(
            " Focus on understanding the basic concepts before moving to more complex problems.",
        ),
        _ => {}
    }

    feedback
}

/// Positive above 70, negative below, scaled by difficulty.
fn confidence_adjustment(score: f64, difficulty: Difficulty) -> f64 {
    (score - 70.0) / 100.0 * difficulty.multiplier()
}

fn adjusted_level(original_level: f64, result: &ChallengeResult) -> f64 {
    let band = match result.score {
        s if s >= 90.0 => 5.0,
        s if s >= 70.0 => 2.0,
        s if s >= 50.0 => 0.0,
        s if s >= 30.0 => -3.0,
        _ => -5.0,
    };
    let adjustment = band + result.confidence_adjustment * 10.0;
    (original_level + adjustment).clamp(0.0, 100.0)
}

fn updated_confidence(current: f64, score: f64) -> f64 {
    (score / 100.0 * 0.7 + current * 0.3).clamp(0.1, 1.0)
}

fn recommendations(score: f64, adjusted_level: f64, original_level: f64) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();

    if score < 50.0 {
        out.extend([
            "Review fundamental concepts for this skill area",
            "Practice with easier challenges before attempting this difficulty level",
        ]);
    } else if score < 70.0 {
        out.extend([
            "Focus on edge cases and error handling in your solutions",
            "Practice similar problems to reinforce your understanding",
        ]);
    } else if score >= 90.0 {
        out.extend([
            "Consider attempting more advanced challenges",
            "Your skills in this area are strong - consider mentoring others",
        ]);
    }

    if adjusted_level < original_level {
        out.extend([
            "Your self-assessment may be higher than your current skill level",
            "Focus on building stronger foundations before advancing",
        ]);
    } else if adjusted_level > original_level {
        out.extend([
            "You may be underestimating your abilities in this area",
            "Consider taking on more challenging projects",
        ]);
    }

    out.into_iter().map(String::from).collect()
}
