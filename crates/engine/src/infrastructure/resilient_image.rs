//! Resilient image generation with per-attempt timeouts and exponential backoff.
//!
//! Wraps an optional [`ImageGenPort`]. Each attempt runs on its own task under
//! a hard timeout; failures are classified so content-safety and credential
//! problems stop immediately while everything else is retried. With no port
//! configured the client renders a deterministic placeholder instead.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::infrastructure::placeholder;
use crate::infrastructure::ports::{
    FailureClass, ImageGenError, ImageGenPort, ImageRequest, ImageResult,
};

/// Retry behavior for image generation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
    /// Hard wall-clock limit for one attempt
    pub attempt_timeout: Duration,
    /// Delay before the first retry; doubles for each retry after that
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout: Duration::from_secs(30),
            base_backoff: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after failed attempt `attempt` (1-based): `base * 2^(attempt-1)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff.saturating_mul(factor)
    }
}

/// Where an image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    Service,
    Placeholder,
}

/// A generated image plus metadata
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub image_data: Vec<u8>,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub generation_time: Duration,
    pub source: ImageSource,
}

enum AttemptFailure {
    TimedOut,
    Failed(ImageGenError),
}

/// Image generation client with retry and placeholder fallback
pub struct GenerationClient {
    port: Option<Arc<dyn ImageGenPort>>,
    policy: RetryPolicy,
    size: u32,
}

impl GenerationClient {
    pub fn new(port: Option<Arc<dyn ImageGenPort>>, policy: RetryPolicy, size: u32) -> Self {
        Self { port, policy, size }
    }

    /// Generate an image for `prompt`.
    ///
    /// Terminal failures ([`ImageGenError::ContentFiltered`],
    /// [`ImageGenError::Configuration`]) return after a single call. When
    /// every attempt fails the error is [`ImageGenError::Timeout`] if all of
    /// them timed out, otherwise [`ImageGenError::GenerationFailed`].
    pub async fn generate_image(&self, prompt: &str) -> Result<GenerationOutcome, ImageGenError> {
        let started = Instant::now();

        let Some(port) = &self.port else {
            tracing::debug!(size = self.size, "No image service configured, rendering placeholder");
            return self.render_placeholder(prompt, started).await;
        };

        let request = ImageRequest::square(prompt, self.size);
        let max_attempts = self.policy.max_attempts();
        let mut all_timed_out = true;
        let mut last_error: Option<ImageGenError> = None;

        for attempt in 1..=max_attempts {
            match self.attempt(port, &request).await {
                Ok(result) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "Image generation succeeded after retry");
                    }
                    return Ok(GenerationOutcome {
                        image_data: result.image_data,
                        format: result.format,
                        width: request.width,
                        height: request.height,
                        generation_time: started.elapsed(),
                        source: ImageSource::Service,
                    });
                }
                Err(AttemptFailure::TimedOut) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        timeout_ms = self.policy.attempt_timeout.as_millis() as u64,
                        "Image generation attempt timed out"
                    );
                }
                Err(AttemptFailure::Failed(e)) => {
                    let class = e.class();
                    if class.is_terminal() {
                        tracing::error!(
                            attempt,
                            error = %e,
                            "Image generation failed with non-retryable error"
                        );
                        return Err(into_terminal(e, class));
                    }
                    tracing::warn!(attempt, max_attempts, error = %e, "Image generation attempt failed");
                    if class != FailureClass::Timeout {
                        all_timed_out = false;
                    }
                    last_error = Some(e);
                }
            }

            if attempt < max_attempts {
                let delay = self.policy.backoff_delay(attempt);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Backing off before next image attempt"
                );
                tokio::time::sleep(delay).await;
            }
        }

        tracing::error!(
            attempts = max_attempts,
            all_timed_out,
            "Image generation failed after all retry attempts"
        );
        if all_timed_out {
            Err(ImageGenError::Timeout {
                attempts: max_attempts,
            })
        } else {
            let detail = last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string());
            Err(ImageGenError::GenerationFailed(detail))
        }
    }

    /// One call on its own task. A timed-out task is abandoned, not aborted.
    async fn attempt(
        &self,
        port: &Arc<dyn ImageGenPort>,
        request: &ImageRequest,
    ) -> Result<ImageResult, AttemptFailure> {
        let port = Arc::clone(port);
        let request = request.clone();
        let handle = tokio::spawn(async move { port.generate(request).await });

        match tokio::time::timeout(self.policy.attempt_timeout, handle).await {
            Ok(Ok(Ok(result))) => Ok(result),
            Ok(Ok(Err(e))) => Err(AttemptFailure::Failed(e)),
            Ok(Err(join_error)) => Err(AttemptFailure::Failed(ImageGenError::GenerationFailed(
                format!("generation task failed: {}", join_error),
            ))),
            Err(_) => Err(AttemptFailure::TimedOut),
        }
    }

    async fn render_placeholder(
        &self,
        prompt: &str,
        started: Instant,
    ) -> Result<GenerationOutcome, ImageGenError> {
        let prompt = prompt.to_string();
        let size = self.size;
        let image_data =
            tokio::task::spawn_blocking(move || placeholder::render_placeholder(&prompt, size))
                .await
                .map_err(|e| ImageGenError::Rendering(format!("placeholder task failed: {}", e)))?
                .map_err(|e| ImageGenError::Rendering(e.to_string()))?;

        Ok(GenerationOutcome {
            image_data,
            format: "png".to_string(),
            width: size,
            height: size,
            generation_time: started.elapsed(),
            source: ImageSource::Placeholder,
        })
    }
}

fn into_terminal(error: ImageGenError, class: FailureClass) -> ImageGenError {
    match (error, class) {
        (ImageGenError::GenerationFailed(msg), FailureClass::ContentFiltered) => {
            ImageGenError::ContentFiltered(msg)
        }
        (ImageGenError::GenerationFailed(msg), FailureClass::Configuration) => {
            ImageGenError::Configuration(msg)
        }
        (other, _) => other,
    }
}
