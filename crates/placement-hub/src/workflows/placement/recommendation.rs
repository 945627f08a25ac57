//! Skill-overlap recommendation rule.
//!
//! A required skill is covered when, after lower-casing, it contains one of the
//! student's skills or one of the student's skills contains it. An opportunity
//! is recommended once the covered share of its required skills reaches the
//! policy threshold (half, rounded up, by default). Opportunities without
//! required skills are always recommended.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{Opportunity, SearchPreferences, User};

/// How recommended opportunities are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationOrder {
    /// Posting order, unchanged.
    CatalogOrder,
    /// Highest match fraction first, then earliest deadline; ties keep posting order.
    Ranked,
}

/// Threshold and ordering applied when selecting recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPolicy {
    pub min_match_percent: u8,
    pub order: RecommendationOrder,
}

impl MatchPolicy {
    pub const DEFAULT_MIN_MATCH_PERCENT: u8 = 50;

    /// Whether `matched` of `required` skills clears the threshold, rounding the
    /// required count up (2 of 4 passes at 50%, 2 of 5 does not).
    pub fn admits(&self, skill_match: &SkillMatch) -> bool {
        let matched = skill_match.matched_count() as u64;
        let required = skill_match.required_count as u64;
        matched * 100 >= required * u64::from(self.min_match_percent)
    }

    /// Score and filter `opportunities` for `student`. Non-students get nothing.
    pub fn select<'a>(
        &self,
        student: &User,
        opportunities: &'a [Opportunity],
    ) -> Vec<ScoredOpportunity<'a>> {
        if !student.is_student() {
            return Vec::new();
        }

        let mut selected: Vec<ScoredOpportunity<'a>> = opportunities
            .iter()
            .map(|opportunity| ScoredOpportunity {
                opportunity,
                skill_match: skill_match(&student.skills, &opportunity.required_skills),
            })
            .filter(|scored| self.admits(&scored.skill_match))
            .collect();

        if self.order == RecommendationOrder::Ranked {
            selected.sort_by(|left, right| {
                right
                    .skill_match
                    .compare_fraction(&left.skill_match)
                    .then_with(|| {
                        left.opportunity
                            .application_deadline
                            .cmp(&right.opportunity.application_deadline)
                    })
            });
        }

        selected
    }
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            min_match_percent: Self::DEFAULT_MIN_MATCH_PERCENT,
            order: RecommendationOrder::CatalogOrder,
        }
    }
}

/// Which of an opportunity's required skills the student covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillMatch {
    /// Covered required skills, in the opportunity's order.
    pub matched: Vec<String>,
    pub required_count: usize,
}

impl SkillMatch {
    pub fn matched_count(&self) -> usize {
        self.matched.len()
    }

    /// Compare match fractions without floating point. No required skills counts as full coverage.
    pub fn compare_fraction(&self, other: &SkillMatch) -> Ordering {
        let (left_num, left_den) = self.fraction_parts();
        let (right_num, right_den) = other.fraction_parts();
        (left_num * right_den).cmp(&(right_num * left_den))
    }

    fn fraction_parts(&self) -> (u64, u64) {
        if self.required_count == 0 {
            (1, 1)
        } else {
            (self.matched_count() as u64, self.required_count as u64)
        }
    }
}

/// An opportunity that cleared the threshold, with the match that admitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredOpportunity<'a> {
    pub opportunity: &'a Opportunity,
    pub skill_match: SkillMatch,
}

/// Recommend opportunities in catalog order using the default 50% threshold.
pub fn recommend<'a>(student: &User, opportunities: &'a [Opportunity]) -> Vec<&'a Opportunity> {
    MatchPolicy::default()
        .select(student, opportunities)
        .into_iter()
        .map(|scored| scored.opportunity)
        .collect()
}

pub fn skill_match(student_skills: &[String], required_skills: &[String]) -> SkillMatch {
    let student_skills: Vec<String> = student_skills
        .iter()
        .map(|skill| skill.to_lowercase())
        .collect();

    let matched = required_skills
        .iter()
        .filter(|required| {
            let required = required.to_lowercase();
            student_skills
                .iter()
                .any(|owned| owned.contains(&required) || required.contains(owned.as_str()))
        })
        .cloned()
        .collect();

    SkillMatch {
        matched,
        required_count: required_skills.len(),
    }
}

/// How an opportunity lines up with a student's stated search preferences.
///
/// Informational only; preferences never remove an opportunity from the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreferenceFit {
    pub location: bool,
    pub stipend: bool,
    pub placement_conversion: bool,
}

impl PreferenceFit {
    pub fn evaluate(preferences: &SearchPreferences, opportunity: &Opportunity) -> Self {
        let location = preferences.location.trim().is_empty()
            || opportunity
                .location
                .trim()
                .eq_ignore_ascii_case(preferences.location.trim())
            || opportunity.location.trim().eq_ignore_ascii_case("remote");
        let stipend = (preferences.min_stipend..=preferences.max_stipend)
            .contains(&opportunity.stipend);
        let placement_conversion =
            !preferences.placement_conversion || opportunity.placement_conversion;

        Self {
            location,
            stipend,
            placement_conversion,
        }
    }

    pub fn is_full(&self) -> bool {
        self.location && self.stipend && self.placement_conversion
    }
}
