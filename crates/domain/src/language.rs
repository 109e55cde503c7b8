//! Coarse script-based language detection.
//!
//! Only used when the narrative analysis service could not answer. Any text
//! containing CJK Unified Ideographs is treated as Chinese; every other script
//! (Latin, Cyrillic, Hangul, kana-only Japanese, ...) falls back to English.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Languages the deterministic fallback has wording for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    /// ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Chinese => "zh",
        }
    }

    /// Detect the fallback language for a piece of text.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_cjk_ideograph) {
            Language::Chinese
        } else {
            Language::English
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_english_is_english() {
        assert_eq!(
            Language::detect("My manager moved the deadline again."),
            Language::English
        );
    }

    #[test]
    fn any_ideograph_means_chinese() {
        assert_eq!(Language::detect("今天工作压力很大"), Language::Chinese);
        assert_eq!(
            Language::detect("Meeting went badly, 我很难过"),
            Language::Chinese
        );
    }

    #[test]
    fn other_scripts_default_to_english() {
        assert_eq!(Language::detect("오늘은 정말 힘들었어요"), Language::English);
        assert_eq!(Language::detect("Сегодня был трудный день"), Language::English);
        assert_eq!(Language::detect("きょうはつかれた"), Language::English);
    }

    #[test]
    fn codes() {
        assert_eq!(Language::English.code(), "en");
        assert_eq!(Language::Chinese.code(), "zh");
    }
}
