use crate::challenge::types::*;
use crate::profile::SkillId;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, LazyLock};
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_LANGUAGE: &str = "javascript";
const FALLBACK_CATEGORY: &str = "programming";

static BUILTIN_TEMPLATES: LazyLock<Arc<[ChallengeTemplate]>> =
    LazyLock::new(|| builtin_templates().into());

/// Challenge templates plus every challenge materialized from them, indexed
/// by skill id.
///
/// Appends for one skill id are serialized by the map's entry lock, so
/// concurrent generation never loses a challenge.
#[derive(Debug)]
pub struct ChallengeCatalog {
    templates: Arc<[ChallengeTemplate]>,
    challenges: DashMap<SkillId, Vec<Challenge>>,
    owners: DashMap<ChallengeId, SkillId>,
}

impl ChallengeCatalog {
    pub fn new() -> Self {
        Self::with_templates(Arc::clone(&BUILTIN_TEMPLATES))
    }

    pub fn with_templates(templates: impl Into<Arc<[ChallengeTemplate]>>) -> Self {
        Self {
            templates: templates.into(),
            challenges: DashMap::new(),
            owners: DashMap::new(),
        }
    }

    pub fn templates(&self) -> &[ChallengeTemplate] {
        &self.templates
    }

    pub fn generate_challenge(
        &self,
        skill_id: &str,
        skill_name: &str,
        category: &str,
        difficulty: Difficulty,
        language: Option<&str>,
    ) -> Result<Challenge, ChallengeError> {
        let language = language.unwrap_or(DEFAULT_LANGUAGE);
        let template = self
            .find_best_template(category, difficulty, language)
            .ok_or_else(|| ChallengeError::NoTemplate {
                category: category.to_string(),
                difficulty,
            })?;

        let challenge = Challenge {
            id: new_challenge_id(),
            skill_id: skill_id.to_string(),
            title: template.title_pattern.replace("{skill}", skill_name),
            difficulty,
            prompt: template.prompt.clone(),
            expected_output: template.expected_output.clone(),
            time_limit_minutes: template.time_limit_minutes,
            language: language.to_string(),
            test_cases: template.test_cases.clone(),
            hints: template.hints.clone(),
        };

        self.challenges
            .entry(skill_id.to_string())
            .or_default()
            .push(challenge.clone());
        self.owners
            .insert(challenge.id.clone(), skill_id.to_string());

        debug!(
            challenge_id = %challenge.id,
            skill_id,
            template_category = %template.category,
            %difficulty,
            "Generated challenge"
        );

        Ok(challenge)
    }

    /// Exact (category, difficulty, language), then (category, difficulty),
    /// then (`programming`, difficulty).
    pub fn find_best_template(
        &self,
        category: &str,
        difficulty: Difficulty,
        language: &str,
    ) -> Option<&ChallengeTemplate> {
        self.templates
            .iter()
            .find(|t| {
                t.category == category && t.difficulty == difficulty && t.language == language
            })
            .or_else(|| {
                self.templates
                    .iter()
                    .find(|t| t.category == category && t.difficulty == difficulty)
            })
            .or_else(|| {
                self.templates
                    .iter()
                    .find(|t| t.category == FALLBACK_CATEGORY && t.difficulty == difficulty)
            })
    }

    pub fn find_challenge(&self, challenge_id: &str) -> Option<Challenge> {
        let skill_id = self.owners.get(challenge_id)?.value().clone();
        self.challenges
            .get(&skill_id)?
            .iter()
            .find(|c| c.id == challenge_id)
            .cloned()
    }

    pub fn available_challenges(&self, skill_id: &str) -> Vec<Challenge> {
        self.challenges
            .get(skill_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }
}

impl Default for ChallengeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn new_challenge_id() -> ChallengeId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("challenge_{}_{}", Utc::now().timestamp_millis(), &suffix[..9])
}

#[allow(clippy::too_many_arguments)]
fn template(
    category: &str,
    difficulty: Difficulty,
    title_pattern: &str,
    prompt: &str,
    expected_output: &str,
    time_limit_minutes: u32,
    test_cases: Vec<TestCase>,
    hints: &[&str],
) -> ChallengeTemplate {
    ChallengeTemplate {
        category: category.to_string(),
        difficulty,
        language: DEFAULT_LANGUAGE.to_string(),
        title_pattern: title_pattern.to_string(),
        prompt: prompt.to_string(),
        expected_output: expected_output.to_string(),
        time_limit_minutes,
        test_cases,
        hints: hints.iter().map(|h| h.to_string()).collect(),
    }
}

fn builtin_templates() -> Vec<ChallengeTemplate> {
    vec![
        template(
            "programming",
            Difficulty::Beginner,
            "Basic {skill} Challenge",
            "Write a function that takes an array of numbers and returns \
             the sum of all even numbers.",
            "Function should return correct sum of even numbers",
            15,
            vec![
                TestCase::visible("[1, 2, 3, 4, 5, 6]", "12"),
                TestCase::visible("[2, 4, 6, 8]", "20"),
                TestCase::hidden("[1, 3, 5]", "0"),
                TestCase::hidden("[]", "0"),
            ],
            &[
                "Consider using filter() and reduce()",
                "Remember to check if number % 2 === 0",
            ],
        ),
        template(
            "programming",
            Difficulty::Intermediate,
            "Intermediate {skill} Challenge",
            "Implement a function that finds the longest common subsequence between two strings.",
            "Function should return the length of the longest common subsequence",
            30,
            vec![
                TestCase::visible("\"ABCDGH\", \"AEDFHR\"", "3"),
                TestCase::visible("\"AGGTAB\", \"GXTXAYB\"", "4"),
                TestCase::hidden("\"\", \"ABC\"", "0"),
                TestCase::hidden("\"ABC\", \"ABC\"", "3"),
            ],
            &[
                "This is a dynamic programming problem",
                "Consider using a 2D array to store intermediate results",
            ],
        ),
        template(
            "programming",
            Difficulty::Advanced,
            "Advanced {skill} Challenge",
            "Implement a function that solves the N-Queens problem and returns \
             all possible solutions.",
            "Function should return array of all valid N-Queens solutions",
            45,
            vec![
                TestCase::visible("4", "2"),
                TestCase::visible("1", "1"),
                TestCase::hidden("8", "92").weighted(2.0),
            ],
            &[
                "Use backtracking algorithm",
                "Check for conflicts in rows, columns, and diagonals",
            ],
        ),
        template(
            "frontend",
            Difficulty::Beginner,
            "Basic React {skill} Challenge",
            "Create a React component that displays a counter with increment \
             and decrement buttons.",
            "Component should manage state and update counter correctly",
            20,
            vec![
                TestCase::visible("Initial render", "Counter shows 0"),
                TestCase::visible("Click increment", "Counter shows 1"),
                TestCase::hidden("Click decrement", "Counter shows -1"),
            ],
            &["Use useState hook", "Handle button click events"],
        ),
        template(
            "data-structures",
            Difficulty::Intermediate,
            "{skill} Implementation Challenge",
            "Implement a binary search tree with insert, search, and delete operations.",
            "BST should maintain proper ordering and support all operations",
            40,
            vec![
                TestCase::visible("Insert 5, 3, 7, 1, 9", "Tree structure correct"),
                TestCase::visible("Search for 7", "Returns true"),
                TestCase::hidden("Delete 3", "Tree maintains BST property").weighted(2.0),
            ],
            &[
                "Remember BST property: left < root < right",
                "Handle deletion cases carefully",
            ],
        ),
    ]
}
