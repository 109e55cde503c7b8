//! Validated visualization requests.
//!
//! Construction is the only validation point: once a request exists its
//! category is known, its emotions are non-empty members of the vocabulary and
//! (for stories) the narrative is within length bounds.

use crate::emotion::{EmotionId, FeelingCategory};
use crate::error::DomainError;

/// Minimum narrative length in characters, after trimming
pub const MIN_NARRATIVE_CHARS: usize = 50;
/// Maximum narrative length in characters, after trimming
pub const MAX_NARRATIVE_CHARS: usize = 5000;

/// Request to draw a feeling as abstract art
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeelingRequest {
    category: FeelingCategory,
    emotions: Vec<EmotionId>,
}

impl FeelingRequest {
    pub fn new(category: FeelingCategory, emotions: Vec<EmotionId>) -> Result<Self, DomainError> {
        if emotions.is_empty() {
            return Err(DomainError::validation(
                "At least one emotion must be selected",
            ));
        }
        Ok(Self { category, emotions })
    }

    /// Build from raw wire values, reporting every unknown emotion at once.
    pub fn parse(category: &str, emotions: &[String]) -> Result<Self, DomainError> {
        let category = category.parse()?;
        Self::new(category, parse_emotions(emotions)?)
    }

    pub fn category(&self) -> FeelingCategory {
        self.category
    }

    pub fn emotions(&self) -> &[EmotionId] {
        &self.emotions
    }
}

/// Request to illustrate a narrative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryRequest {
    narrative: String,
    category: FeelingCategory,
    emotions: Vec<EmotionId>,
}

impl StoryRequest {
    pub fn new(
        narrative: &str,
        category: FeelingCategory,
        emotions: Vec<EmotionId>,
    ) -> Result<Self, DomainError> {
        let narrative = narrative.trim();
        let length = narrative.chars().count();
        if length < MIN_NARRATIVE_CHARS {
            return Err(DomainError::NarrativeTooShort {
                min: MIN_NARRATIVE_CHARS,
                actual: length,
            });
        }
        if length > MAX_NARRATIVE_CHARS {
            return Err(DomainError::NarrativeTooLong {
                max: MAX_NARRATIVE_CHARS,
                actual: length,
            });
        }
        if emotions.is_empty() {
            return Err(DomainError::validation(
                "Selected emotions are required to understand your story",
            ));
        }

        Ok(Self {
            narrative: narrative.to_string(),
            category,
            emotions,
        })
    }

    pub fn parse(narrative: &str, category: &str, emotions: &[String]) -> Result<Self, DomainError> {
        let category = category.parse()?;
        Self::new(narrative, category, parse_emotions(emotions)?)
    }

    /// The trimmed narrative
    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn category(&self) -> FeelingCategory {
        self.category
    }

    pub fn emotions(&self) -> &[EmotionId] {
        &self.emotions
    }
}

fn parse_emotions(raw: &[String]) -> Result<Vec<EmotionId>, DomainError> {
    let mut parsed = Vec::with_capacity(raw.len());
    let mut invalid = Vec::new();

    for value in raw {
        match value.parse::<EmotionId>() {
            Ok(id) => parsed.push(id),
            Err(_) => invalid.push(value.as_str()),
        }
    }

    if !invalid.is_empty() {
        let valid: Vec<&str> = EmotionId::all().iter().map(|id| id.as_str()).collect();
        return Err(DomainError::validation(format!(
            "Invalid emotions: [{}]. Valid: [{}]",
            invalid.join(", "),
            valid.join(", ")
        )));
    }

    Ok(parsed)
}
