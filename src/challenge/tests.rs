use super::*;
use crate::profile::{UserSkill, ValidationMethod, ValidationRecord};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::thread;

const SUM_EVENS: &str =
    "function sumEvens(arr) { return arr.filter(n => n % 2 === 0).reduce((a, b) => a + b, 0); }";

/// Answers from a fixed input -> output table, failing on anything else.
struct TableExecutor(HashMap<String, String>);

impl TableExecutor {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self(
            pairs
                .iter()
                .map(|(i, o)| (i.to_string(), o.to_string()))
                .collect(),
        )
    }
}

impl CodeExecutor for TableExecutor {
    fn execute(&self, _code: &str, input: &str, _language: &str) -> Result<String, ExecutionError> {
        self.0
            .get(input)
            .cloned()
            .ok_or_else(|| ExecutionError::Failed(format!("no answer for {input}")))
    }
}

fn grader() -> (Arc<ChallengeCatalog>, ChallengeGrader) {
    let catalog = Arc::new(ChallengeCatalog::new());
    (Arc::clone(&catalog), ChallengeGrader::new(catalog))
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn result_with(score: f64, difficulty: Difficulty) -> ChallengeResult {
    ChallengeResult {
        challenge_id: "challenge_1_abc".to_string(),
        skill_id: "skill-js".to_string(),
        score,
        completion_time_secs: 60.0,
        passed_tests: 0,
        total_tests: 0,
        feedback: "feedback".to_string(),
        confidence_adjustment: (score - 70.0) / 100.0 * difficulty.multiplier(),
    }
}

fn record(days_ago: i64, score: f64) -> ValidationRecord {
    ValidationRecord {
        date: Utc::now() - ChronoDuration::days(days_ago),
        method: ValidationMethod::Challenge,
        score,
        feedback: None,
    }
}

#[test]
fn test_sum_evens_challenge_passes_with_filter_reduce() {
    let (catalog, grader) = grader();
    let challenge = catalog
        .generate_challenge(
            "sum-evens",
            "Sum Evens",
            "programming",
            Difficulty::Beginner,
            Some("javascript"),
        )
        .unwrap();
    assert_eq!(challenge.title, "Basic Sum Evens Challenge");
    assert_eq!(challenge.time_limit_minutes, 15);

    let run = grader.run_test_cases(SUM_EVENS, &challenge.test_cases, &challenge.language);
    let first = &run.outcomes[0];
    assert_eq!(first.input, "[1, 2, 3, 4, 5, 6]");
    assert_eq!(first.actual, "12");
    assert!(first.passed);
    assert_eq!(run.passed(), 4);
}

#[test]
fn test_all_cases_at_zero_time_score_100() {
    let (catalog, grader) = grader();
    let challenge = catalog
        .generate_challenge("sum-evens", "Sum Evens", "programming", Difficulty::Beginner, None)
        .unwrap();
    assert_eq!(challenge.language, "javascript");

    let result = grader.validate_challenge(&challenge.id, SUM_EVENS, 0.0).unwrap();
    assert!(approx(result.score, 100.0));
    assert_eq!(result.passed_tests, 4);
    assert_eq!(result.total_tests, 4);
    assert_eq!(result.skill_id, "sum-evens");
    assert!(approx(result.confidence_adjustment, 0.15));
    assert_eq!(
        result.feedback,
        "You passed 4 out of 4 test cases (100.0%). Excellent work! \
         Your solution demonstrates strong understanding of the concept."
    );
}

#[test]
fn test_no_cases_at_full_limit_score_zero() {
    let (catalog, grader) = grader();
    let challenge = catalog
        .generate_challenge("js", "JavaScript", "programming", Difficulty::Beginner, None)
        .unwrap();

    let result = grader.validate_challenge(&challenge.id, "return 42;", 15.0 * 60.0).unwrap();
    assert!(approx(result.score, 0.0));
    assert_eq!(result.passed_tests, 0);
    assert!(approx(result.confidence_adjustment, -0.35));
    assert!(result.feedback.starts_with("You passed 0 out of 4 test cases (0.0%). "));
    assert!(result.feedback.contains("Consider reviewing the fundamentals."));
    assert!(result.feedback.ends_with(
        " Focus on understanding the basic concepts before moving to more complex problems."
    ));
}

#[test]
fn test_overtime_gets_no_time_bonus() {
    let (catalog, grader) = grader();
    let challenge = catalog
        .generate_challenge("js", "JavaScript", "programming", Difficulty::Beginner, None)
        .unwrap();

    let result = grader.validate_challenge(&challenge.id, SUM_EVENS, 3600.0).unwrap();
    assert!(approx(result.score, 70.0));
}

#[test]
fn test_weighted_cases_and_advanced_remark() {
    let catalog = Arc::new(ChallengeCatalog::new());
    let executor = TableExecutor::new(&[("4", "2"), ("1", "1"), ("8", "90")]);
    let grader = ChallengeGrader::with_executor(Arc::clone(&catalog), Arc::new(executor));
    let challenge = catalog
        .generate_challenge("algo", "Algorithms", "programming", Difficulty::Advanced, None)
        .unwrap();

    let result = grader.validate_challenge(&challenge.id, "queens()", 0.0).unwrap();
    // 2 of 4 weight units -> 35, plus the full 30 time bonus
    assert!(approx(result.score, 65.0));
    assert_eq!(result.passed_tests, 2);
    assert_eq!(result.total_tests, 3);
    assert!(result.feedback.starts_with("You passed 2 out of 3 test cases (66.7%). "));
    assert!(result.feedback.contains("needs improvement in edge cases or efficiency."));
    assert!(
        result
            .feedback
            .ends_with(" Tackling advanced challenges shows strong problem-solving skills.")
    );
}

#[test]
fn test_executor_errors_become_failed_cases() {
    let catalog = Arc::new(ChallengeCatalog::new());
    let executor = TableExecutor::new(&[("4", "2")]);
    let grader = ChallengeGrader::with_executor(catalog, Arc::new(executor));
    let cases = vec![TestCase::visible("4", "2"), TestCase::hidden("5", "10")];

    let run = grader.run_test_cases("code", &cases, "javascript");
    assert_eq!(run.passed(), 1);
    assert_eq!(run.total(), 2);
    assert!(!run.outcomes[1].passed);
    assert_eq!(run.outcomes[1].actual, "Error: Execution failed: no answer for 5");
}

#[test]
fn test_zero_case_template_scores_time_only() {
    let template = ChallengeTemplate {
        category: "writing".to_string(),
        difficulty: Difficulty::Intermediate,
        language: "markdown".to_string(),
        title_pattern: "{skill} Essay".to_string(),
        prompt: "Write something".to_string(),
        expected_output: "An essay".to_string(),
        time_limit_minutes: 10,
        test_cases: Vec::new(),
        hints: Vec::new(),
    };
    let catalog = Arc::new(ChallengeCatalog::with_templates(vec![template]));
    let grader = ChallengeGrader::new(Arc::clone(&catalog));
    let challenge = catalog
        .generate_challenge("w", "Writing", "writing", Difficulty::Intermediate, Some("markdown"))
        .unwrap();

    let result = grader.validate_challenge(&challenge.id, "text", 300.0).unwrap();
    assert!(approx(result.score, 15.0));
    assert!(result.feedback.starts_with("You passed 0 out of 0 test cases (0.0%). "));
}

#[test]
fn test_template_fallback_tiers() {
    let catalog = ChallengeCatalog::new();

    let exact = catalog
        .find_best_template("frontend", Difficulty::Beginner, "javascript")
        .unwrap();
    assert_eq!(exact.category, "frontend");

    let any_language = catalog
        .find_best_template("frontend", Difficulty::Beginner, "typescript")
        .unwrap();
    assert_eq!(any_language.category, "frontend");

    let programming = catalog
        .find_best_template("backend", Difficulty::Intermediate, "go")
        .unwrap();
    assert_eq!(programming.category, "programming");
    assert_eq!(programming.difficulty, Difficulty::Intermediate);

    let challenge = catalog
        .generate_challenge("k8s", "Kubernetes", "devops", Difficulty::Advanced, Some("yaml"))
        .unwrap();
    assert_eq!(challenge.title, "Advanced Kubernetes Challenge");
    assert_eq!(challenge.language, "yaml");
    assert_eq!(challenge.time_limit_minutes, 45);
}

#[test]
fn test_missing_template_is_an_error() {
    let only_beginner: Vec<ChallengeTemplate> = ChallengeCatalog::new()
        .templates()
        .iter()
        .filter(|t| t.difficulty == Difficulty::Beginner)
        .cloned()
        .collect();
    let catalog = ChallengeCatalog::with_templates(only_beginner);

    let err = catalog
        .generate_challenge("rust", "Rust", "systems", Difficulty::Advanced, None)
        .unwrap_err();
    assert!(matches!(
        err,
        ChallengeError::NoTemplate {
            ref category,
            difficulty: Difficulty::Advanced,
        } if category == "systems"
    ));
    assert!(catalog.available_challenges("rust").is_empty());
}

#[test]
fn test_unknown_challenge_not_found() {
    let (_, grader) = grader();
    let err = grader.validate_challenge("challenge_0_missing", SUM_EVENS, 1.0).unwrap_err();
    assert!(matches!(err, ChallengeError::NotFound(ref id) if id == "challenge_0_missing"));
    assert_eq!(err.to_string(), "Challenge challenge_0_missing not found");
}

#[test]
fn test_challenges_retained_per_skill() {
    let catalog = ChallengeCatalog::new();
    let first = catalog
        .generate_challenge("js", "JavaScript", "programming", Difficulty::Beginner, None)
        .unwrap();
    let second = catalog
        .generate_challenge("js", "JavaScript", "programming", Difficulty::Intermediate, None)
        .unwrap();
    catalog
        .generate_challenge("react", "React", "frontend", Difficulty::Beginner, None)
        .unwrap();

    let listed: Vec<_> = catalog.available_challenges("js").into_iter().map(|c| c.id).collect();
    assert_eq!(listed, vec![first.id.clone(), second.id.clone()]);
    assert_eq!(catalog.find_challenge(&second.id), Some(second));
    assert!(first.id.starts_with("challenge_"));
    assert_eq!(catalog.available_challenges("react").len(), 1);
}

#[test]
fn test_concurrent_generation_keeps_every_challenge() {
    let catalog = Arc::new(ChallengeCatalog::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let catalog = Arc::clone(&catalog);
            thread::spawn(move || {
                (0..25)
                    .map(|_| {
                        catalog
                            .generate_challenge(
                                "shared",
                                "Shared",
                                "programming",
                                Difficulty::Beginner,
                                None,
                            )
                            .unwrap()
                            .id
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let generated: Vec<String> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    let stored = catalog.available_challenges("shared");
    assert_eq!(stored.len(), 200);
    let stored_ids: HashSet<_> = stored.into_iter().map(|c| c.id).collect();
    for id in &generated {
        assert!(stored_ids.contains(id));
    }
}

#[test]
fn test_low_score_lowers_level_and_floors_confidence() {
    let (_, grader) = grader();
    let skill = UserSkill::new("js", "JavaScript", "programming", 60.0);
    let result = result_with(0.0, Difficulty::Beginner);

    let validation = grader.process_validation_result(&skill, &result);
    assert!(approx(validation.original_level, 60.0));
    // -5 band, -0.35 * 10 adjustment
    assert!(approx(validation.adjusted_level, 51.5));
    assert!(approx(validation.confidence_score, 0.1));
    assert_eq!(validation.validation_record.method, ValidationMethod::Challenge);
    assert_eq!(validation.validation_record.feedback.as_deref(), Some("feedback"));
    assert_eq!(
        validation.recommendations,
        vec![
            "Review fundamental concepts for this skill area",
            "Practice with easier challenges before attempting this difficulty level",
            "Your self-assessment may be higher than your current skill level",
            "Focus on building stronger foundations before advancing",
        ]
    );
    // skill untouched until applied
    assert!(skill.validation_history.is_empty());
}

#[test]
fn test_high_score_clamps_level_at_100() {
    let (_, grader) = grader();
    let skill = UserSkill::new("js", "JavaScript", "programming", 98.0);
    let result = result_with(100.0, Difficulty::Advanced);

    let validation = grader.process_validation_result(&skill, &result);
    assert!(approx(validation.adjusted_level, 100.0));
    assert!(approx(validation.confidence_score, 0.7 + 0.3 * 0.3));
    assert_eq!(
        validation.recommendations,
        vec![
            "Consider attempting more advanced challenges",
            "Your skills in this area are strong - consider mentoring others",
            "You may be underestimating your abilities in this area",
            "Consider taking on more challenging projects",
        ]
    );
}

#[test]
fn test_middle_band_recommendations() {
    let (_, grader) = grader();
    let skill = UserSkill::new("js", "JavaScript", "programming", 0.0);

    // 60 on intermediate: band 0, adjustment -1 -> clamped at 0, level unchanged
    let validation =
        grader.process_validation_result(&skill, &result_with(60.0, Difficulty::Intermediate));
    assert!(approx(validation.adjusted_level, 0.0));
    assert_eq!(
        validation.recommendations,
        vec![
            "Focus on edge cases and error handling in your solutions",
            "Practice similar problems to reinforce your understanding",
        ]
    );

    // 80: no band text, level rises
    let validation =
        grader.process_validation_result(&skill, &result_with(80.0, Difficulty::Intermediate));
    assert!(approx(validation.adjusted_level, 3.0));
    assert_eq!(validation.recommendations.len(), 2);
    assert_eq!(
        validation.recommendations[0],
        "You may be underestimating your abilities in this area"
    );
}

#[test]
fn test_apply_validation_appends_history() {
    let (_, grader) = grader();
    let mut skill = UserSkill::new("js", "JavaScript", "programming", 50.0);
    let result = result_with(95.0, Difficulty::Intermediate);

    let validation = grader.apply_validation(&mut skill, &result);
    assert_eq!(skill.validation_history.len(), 1);
    assert_eq!(skill.validation_history[0], validation.validation_record);
    assert!(approx(skill.self_assessed_level, validation.adjusted_level));
    assert!(approx(skill.confidence_score, validation.confidence_score));
    assert_eq!(skill.last_updated, validation.validation_record.date);

    grader.apply_validation(&mut skill, &result);
    assert_eq!(skill.validation_history.len(), 2);
}

#[test]
fn test_skill_confidence_from_history() {
    let now = Utc::now();
    assert!(approx(calculate_skill_confidence_at(&[], now), 0.3));
    assert!(approx(calculate_skill_confidence_at(&[record(120, 100.0)], now), 0.4));
    assert!(approx(calculate_skill_confidence_at(&[record(1, 100.0)], now), 1.0));

    // newest first: 50 weighs 1.0, 100 weighs 0.8
    let history = vec![record(30, 100.0), record(2, 50.0), record(200, 0.0)];
    let expected = (50.0 + 80.0) / 1.8 / 100.0 + 0.2;
    assert!(approx(calculate_skill_confidence_at(&history, now), expected));

    assert!(approx(calculate_skill_confidence(&[record(1, 40.0)]), 0.5));
}

#[test]
fn test_difficulty_parsing() {
    assert_eq!("Advanced".parse::<Difficulty>(), Ok(Difficulty::Advanced));
    assert_eq!(" beginner ".parse::<Difficulty>(), Ok(Difficulty::Beginner));
    assert!("expert".parse::<Difficulty>().is_err());
    assert_eq!(Difficulty::Intermediate.to_string(), "intermediate");
}
