//! Moodscape Domain - emotion vocabulary, requests, and analysis types.
//!
//! Pure data and validation only: no I/O, no async, no external services.

pub mod analysis;
pub mod emotion;
pub mod error;
pub mod language;
pub mod request;

pub use analysis::{AnalysisFactor, StoryAnalysis, MAX_FACTORS};
pub use emotion::{EmotionId, EmotionProfile, EnergyLevel, FeelingCategory};
pub use error::DomainError;
pub use language::Language;
pub use request::{FeelingRequest, StoryRequest, MAX_NARRATIVE_CHARS, MIN_NARRATIVE_CHARS};
