//! Errors surfaced by the visualization use cases.

use moodscape_domain::DomainError;

use crate::infrastructure::ports::ImageGenError;

/// Failure of a visualization request.
///
/// Narrative analysis never appears here: the analyzer always degrades to a
/// local fallback instead of failing the request.
#[derive(Debug, thiserror::Error)]
pub enum VisualizationError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Generation(ImageGenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ImageGenError> for VisualizationError {
    fn from(error: ImageGenError) -> Self {
        match error {
            ImageGenError::Rendering(msg) => VisualizationError::Internal(msg),
            other => VisualizationError::Generation(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendering_failures_are_internal() {
        let error: VisualizationError = ImageGenError::Rendering("encoder broke".into()).into();
        assert!(matches!(error, VisualizationError::Internal(msg) if msg == "encoder broke"));
    }

    #[test]
    fn service_failures_stay_generation_errors() {
        let error: VisualizationError = ImageGenError::Timeout { attempts: 3 }.into();
        assert!(matches!(
            error,
            VisualizationError::Generation(ImageGenError::Timeout { attempts: 3 })
        ));
    }
}
