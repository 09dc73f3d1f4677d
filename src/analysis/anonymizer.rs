//! Privacy reduction applied to user data before it leaves the process.
//!
//! Levels are layered: `Enhanced` runs the `Basic` transform first and
//! `Maximum` runs the `Enhanced` transform first. Every step is idempotent,
//! so anonymizing already anonymized data at the same level is a no-op.

use crate::analysis::types::PrivacyLevel;
use crate::profile::{UserSkill, UserSkillData};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

const HASH_PREFIX: &str = "anon_";
const HASH_HEX_LEN: usize = 16;
const FALLBACK_ROLE: &str = "other_technical_role";

const ROLE_CATEGORIES: &[(&str, &str)] = &[
    ("senior software engineer", "software_engineer"),
    ("software engineer", "software_engineer"),
    ("frontend developer", "frontend_developer"),
    ("backend developer", "backend_developer"),
    ("full stack developer", "fullstack_developer"),
    ("data scientist", "data_scientist"),
    ("product manager", "product_manager"),
    ("devops engineer", "devops_engineer"),
];

pub struct DataAnonymizer;

impl DataAnonymizer {
    /// Deep copy of `data` reduced to `level`. The input is never modified.
    pub fn anonymize(data: &UserSkillData, level: PrivacyLevel) -> UserSkillData {
        let mut anonymized = data.clone();
        match level {
            PrivacyLevel::Basic => Self::basic(&mut anonymized),
            PrivacyLevel::Enhanced => Self::enhanced(&mut anonymized),
            PrivacyLevel::Maximum => Self::maximum(&mut anonymized),
        }
        anonymized
    }

    fn basic(data: &mut UserSkillData) {
        data.personal_details = None;

        if let Some(analysis) = data.github_analysis.as_mut() {
            analysis.username = None;
            analysis.email = None;
        }

        for platform in &mut data.learning_platform_data {
            platform.user_id = pseudonym(&platform.user_id);
        }
    }

    fn enhanced(data: &mut UserSkillData) {
        Self::basic(data);

        for skill in &mut data.manual_skills {
            skill.last_updated = DateTime::<Utc>::UNIX_EPOCH;
            skill.validation_history.clear();
        }

        for assessment in &mut data.assessment_history {
            assessment.completed_at = DateTime::<Utc>::UNIX_EPOCH;
        }

        if let Some(goals) = data.career_goals.as_mut()
            && !goals.target_role.is_empty()
        {
            goals.target_role = generalize_role(&goals.target_role).to_string();
        }
    }

    fn maximum(data: &mut UserSkillData) {
        Self::enhanced(data);

        data.learning_platform_data.clear();
        data.github_analysis = None;

        for skill in &mut data.manual_skills {
            skill.name = category_pseudonym(skill);
            skill.id = pseudonym(&skill.id);
        }
    }
}

/// Stable one-way pseudonym. Values that are already pseudonyms are
/// returned unchanged.
pub fn pseudonym(value: &str) -> String {
    if is_pseudonym(value) {
        return value.to_string();
    }
    let digest = Sha256::digest(value.as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(HASH_HEX_LEN);
    format!("{HASH_PREFIX}{encoded}")
}

/// `anon_` followed by exactly [`HASH_HEX_LEN`] lowercase hex digits.
fn is_pseudonym(value: &str) -> bool {
    value.strip_prefix(HASH_PREFIX).is_some_and(|digest| {
        digest.len() == HASH_HEX_LEN
            && digest
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    })
}

fn category_pseudonym(skill: &UserSkill) -> String {
    let category = skill.category.trim().to_lowercase().replace([' ', '-'], "_");
    format!("skill_{}_{}", category, skill.self_assessed_level)
}

/// Coarse role category. Inputs that are already a category map to themselves.
pub fn generalize_role(role: &str) -> &'static str {
    let normalized = role.trim().to_lowercase();
    ROLE_CATEGORIES
        .iter()
        .find(|(title, category)| *title == normalized || *category == normalized)
        .map(|(_, category)| *category)
        .unwrap_or(FALLBACK_ROLE)
}
