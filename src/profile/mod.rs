//! User skill profile model shared by the analysis client and the challenge
//! grader.

pub mod types;

pub use types::*;
