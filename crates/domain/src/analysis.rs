//! Narrative analysis results.
//!
//! [`StoryAnalysis::new`] enforces the factor bounds (at least one and at most
//! [`MAX_FACTORS`] well-formed factors). Model output is always validated
//! through it. The fields stay public, so code assembling an analysis from
//! fixed tables can use a struct literal and is responsible for the same
//! bounds.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Upper bound on factors kept from any analysis
pub const MAX_FACTORS: usize = 5;

/// A named contributing cause plus its explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFactor {
    /// Short, title-cased label
    pub factor: String,
    /// Free-form explanation in the narrative's language
    pub insight: String,
}

impl AnalysisFactor {
    pub fn new(factor: impl Into<String>, insight: impl Into<String>) -> Self {
        Self {
            factor: factor.into(),
            insight: insight.into(),
        }
    }

    /// Both label and insight carry non-whitespace text.
    pub fn is_well_formed(&self) -> bool {
        !self.factor.trim().is_empty() && !self.insight.trim().is_empty()
    }
}

/// Structured breakdown of a narrative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryAnalysis {
    /// General category of situation, not the literal event
    pub central_stressor: String,
    pub factors: Vec<AnalysisFactor>,
    /// ISO 639-1 style code
    pub language: String,
}

impl StoryAnalysis {
    pub fn new(
        central_stressor: impl Into<String>,
        factors: Vec<AnalysisFactor>,
        language: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let central_stressor = central_stressor.into();
        if central_stressor.trim().is_empty() {
            return Err(DomainError::validation("central stressor cannot be empty"));
        }
        if factors.is_empty() {
            return Err(DomainError::validation(
                "analysis must contain at least one factor",
            ));
        }
        if factors.len() > MAX_FACTORS {
            return Err(DomainError::validation(format!(
                "analysis may contain at most {} factors (got {})",
                MAX_FACTORS,
                factors.len()
            )));
        }
        if let Some(bad) = factors.iter().position(|f| !f.is_well_formed()) {
            return Err(DomainError::validation(format!(
                "factor {} is missing a label or insight",
                bad
            )));
        }
        let language = language.into();
        if language.trim().is_empty() {
            return Err(DomainError::validation("language code cannot be empty"));
        }

        Ok(Self {
            central_stressor,
            factors,
            language,
        })
    }

    pub fn factor_labels(&self) -> impl Iterator<Item = &str> {
        self.factors.iter().map(|f| f.factor.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factor(name: &str) -> AnalysisFactor {
        AnalysisFactor::new(name, "because")
    }

    #[test]
    fn accepts_one_to_five_factors() {
        for n in 1..=MAX_FACTORS {
            let factors = (0..n).map(|i| factor(&format!("Factor {}", i))).collect();
            assert!(StoryAnalysis::new("Work Pressure", factors, "en").is_ok());
        }
    }

    #[test]
    fn rejects_empty_and_oversized_factor_lists() {
        assert!(StoryAnalysis::new("Work Pressure", vec![], "en").is_err());
        let six = (0..6).map(|i| factor(&format!("F{}", i))).collect();
        assert!(StoryAnalysis::new("Work Pressure", six, "en").is_err());
    }

    #[test]
    fn rejects_blank_labels_and_stressor() {
        let blank = vec![AnalysisFactor::new("  ", "insight")];
        assert!(StoryAnalysis::new("Work Pressure", blank, "en").is_err());
        assert!(StoryAnalysis::new(" ", vec![factor("Fear")], "en").is_err());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let analysis =
            StoryAnalysis::new("Family Tension", vec![factor("Guilt")], "en").expect("valid");
        let json = serde_json::to_value(&analysis).expect("serialize");
        assert_eq!(json["central_stressor"], "Family Tension");
        assert_eq!(json["factors"][0]["factor"], "Guilt");
        assert_eq!(json["factors"][0]["insight"], "because");
        assert_eq!(json["language"], "en");
    }
}
