//! Code execution seam used by the grader.
//!
//! No sandbox ships with the crate; [`SimulatedExecutor`] recognizes a small
//! set of solution shapes and otherwise echoes a placeholder.

use regex::Regex;
use std::sync::LazyLock;
use tracing::trace;

pub const SIMULATED_OUTPUT: &str = "simulated_output";

static FILTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bfilter\b").expect("static regex"));
static REDUCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\breduce\b").expect("static regex"));

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Execution failed: {0}")]
    Failed(String),
}

/// Runs candidate code against one test input and returns its textual output.
pub trait CodeExecutor: Send + Sync {
    fn execute(&self, code: &str, input: &str, language: &str) -> Result<String, ExecutionError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedExecutor;

impl SimulatedExecutor {
    pub fn new() -> Self {
        Self
    }

    fn looks_like_sum_of_evens(code: &str) -> bool {
        FILTER.is_match(code) && REDUCE.is_match(code)
    }
}

impl CodeExecutor for SimulatedExecutor {
    fn execute(&self, code: &str, input: &str, language: &str) -> Result<String, ExecutionError> {
        trace!(language, input, "Simulating execution");

        if Self::looks_like_sum_of_evens(code) && input.contains('[') {
            return sum_of_evens(input);
        }

        Ok(SIMULATED_OUTPUT.to_string())
    }
}

/// Sum of the even integers in a JSON array, `"0"` when the input is not one.
fn sum_of_evens(input: &str) -> Result<String, ExecutionError> {
    let Ok(numbers) = serde_json::from_str::<Vec<i64>>(input.trim()) else {
        return Ok("0".to_string());
    };

    numbers
        .iter()
        .filter(|n| *n % 2 == 0)
        .try_fold(0i64, |total, n| total.checked_add(*n))
        .map(|total| total.to_string())
        .ok_or_else(|| ExecutionError::Failed("integer overflow while summing".to_string()))
}
