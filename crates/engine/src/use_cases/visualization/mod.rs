//! Mood visualization use cases.
//!
//! - Drawing a feeling (category + emotions) as abstract art
//! - Illustrating a narrative as a radial infographic, with analysis
//! - Emotion vocabulary discovery
//! - Probing the external generation services

pub mod error;
pub mod prompt_builder;
pub mod story_analysis;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use moodscape_domain::{EmotionId, FeelingRequest, StoryAnalysis, StoryRequest};

use crate::infrastructure::ports::{ImageGenPort, LlmPort};
use crate::infrastructure::resilient_image::{GenerationClient, GenerationOutcome};

pub use error::VisualizationError;
pub use story_analysis::StoryAnalyzer;

/// Logged prompt prefix length
const PROMPT_LOG_CHARS: usize = 200;

/// Container for visualization use cases.
pub struct VisualizationUseCases {
    pub feeling: Arc<VisualizeFeeling>,
    pub story: Arc<VisualizeStory>,
    pub emotions: Arc<ListEmotions>,
    pub health: Arc<CheckServices>,
}

impl VisualizationUseCases {
    pub fn new(
        feeling: Arc<VisualizeFeeling>,
        story: Arc<VisualizeStory>,
        emotions: Arc<ListEmotions>,
        health: Arc<CheckServices>,
    ) -> Self {
        Self {
            feeling,
            story,
            emotions,
            health,
        }
    }
}

/// A generated image with the prompt and palette that produced it
#[derive(Debug, Clone)]
pub struct Visualization {
    pub outcome: GenerationOutcome,
    pub prompt_used: String,
    pub dominant_colors: Vec<String>,
}

/// A story visualization plus the analysis that shaped its prompt
#[derive(Debug, Clone)]
pub struct StoryVisualization {
    pub visualization: Visualization,
    pub analysis: StoryAnalysis,
}

// =============================================================================
// Feeling
// =============================================================================

/// Draw a feeling as abstract art.
pub struct VisualizeFeeling {
    client: Arc<GenerationClient>,
}

impl VisualizeFeeling {
    pub fn new(client: Arc<GenerationClient>) -> Self {
        Self { client }
    }

    pub async fn execute(
        &self,
        request: &FeelingRequest,
    ) -> Result<Visualization, VisualizationError> {
        tracing::info!(
            category = request.category().as_str(),
            emotions = %emotion_list(request.emotions()),
            "Generating feeling visualization"
        );

        let prompt = prompt_builder::build_feeling_prompt(request.category(), request.emotions());
        tracing::debug!(prompt = %prompt_preview(&prompt), "Built feeling prompt");

        let outcome = self.client.generate_image(&prompt).await?;

        Ok(Visualization {
            outcome,
            dominant_colors: prompt_builder::dominant_colors(request.emotions()),
            prompt_used: prompt,
        })
    }
}

// =============================================================================
// Story
// =============================================================================

/// Analyze a narrative and illustrate it.
pub struct VisualizeStory {
    analyzer: Arc<StoryAnalyzer>,
    client: Arc<GenerationClient>,
}

impl VisualizeStory {
    pub fn new(analyzer: Arc<StoryAnalyzer>, client: Arc<GenerationClient>) -> Self {
        Self { analyzer, client }
    }

    pub async fn execute(
        &self,
        request: &StoryRequest,
    ) -> Result<StoryVisualization, VisualizationError> {
        tracing::info!(
            category = request.category().as_str(),
            emotions = %emotion_list(request.emotions()),
            text_length = request.narrative().chars().count(),
            "Generating story visualization"
        );

        let analysis = self
            .analyzer
            .analyze(request.narrative(), request.emotions())
            .await;

        let prompt = prompt_builder::build_story_prompt(
            request.narrative(),
            request.category(),
            request.emotions(),
            Some(analysis.central_stressor.as_str()),
            Some(analysis.factors.as_slice()),
        );
        tracing::debug!(prompt = %prompt_preview(&prompt), "Built story prompt");

        let outcome = self.client.generate_image(&prompt).await?;

        Ok(StoryVisualization {
            visualization: Visualization {
                outcome,
                dominant_colors: prompt_builder::dominant_colors(request.emotions()),
                prompt_used: prompt,
            },
            analysis,
        })
    }
}

// =============================================================================
// Emotion discovery
// =============================================================================

/// The emotion vocabulary, grouped for pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmotionCatalog {
    pub positive_emotions: Vec<EmotionId>,
    pub negative_emotions: Vec<EmotionId>,
    pub all_emotions: Vec<EmotionId>,
}

pub struct ListEmotions;

impl ListEmotions {
    pub fn execute(&self) -> EmotionCatalog {
        EmotionCatalog {
            positive_emotions: EmotionId::positive().to_vec(),
            negative_emotions: EmotionId::negative().to_vec(),
            all_emotions: EmotionId::all().to_vec(),
        }
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Healthy,
    Unhealthy,
    NotConfigured,
}

/// Result of probing one external service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCheck {
    pub status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceCheck {
    fn healthy(latency: Duration) -> Self {
        Self {
            status: CheckStatus::Healthy,
            latency_ms: Some(latency.as_millis() as u64),
            error: None,
        }
    }

    fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: CheckStatus::Unhealthy,
            latency_ms: None,
            error: Some(error.into()),
        }
    }

    fn not_configured() -> Self {
        Self {
            status: CheckStatus::NotConfigured,
            latency_ms: None,
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthChecks {
    pub image_service: ServiceCheck,
    pub text_service: ServiceCheck,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    pub checks: HealthChecks,
    pub timestamp: DateTime<Utc>,
}

/// Probe the image and text services.
///
/// Healthy only when the image service answers; a missing text model is
/// fine (analysis falls back) but a configured one that fails degrades.
pub struct CheckServices {
    image: Option<Arc<dyn ImageGenPort>>,
    text: Option<Arc<dyn LlmPort>>,
    timeout: Duration,
}

impl CheckServices {
    pub fn new(
        image: Option<Arc<dyn ImageGenPort>>,
        text: Option<Arc<dyn LlmPort>>,
        timeout: Duration,
    ) -> Self {
        Self {
            image,
            text,
            timeout,
        }
    }

    pub async fn execute(&self) -> ServiceHealth {
        let image = async {
            match &self.image {
                Some(port) => probe(port.check_health(), self.timeout).await,
                None => ServiceCheck::not_configured(),
            }
        };
        let text = async {
            match &self.text {
                Some(port) => probe(port.check_health(), self.timeout).await,
                None => ServiceCheck::not_configured(),
            }
        };
        let (image_service, text_service) = tokio::join!(image, text);

        let status = if image_service.status == CheckStatus::Healthy
            && text_service.status != CheckStatus::Unhealthy
        {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        if status == HealthStatus::Degraded {
            tracing::warn!(
                image = ?image_service.status,
                text = ?text_service.status,
                "Visualization services degraded"
            );
        }

        ServiceHealth {
            status,
            checks: HealthChecks {
                image_service,
                text_service,
            },
            timestamp: Utc::now(),
        }
    }
}

async fn probe<F, E>(check: F, timeout: Duration) -> ServiceCheck
where
    F: Future<Output = Result<bool, E>>,
    E: std::fmt::Display,
{
    let started = Instant::now();
    match tokio::time::timeout(timeout, check).await {
        Ok(Ok(true)) => ServiceCheck::healthy(started.elapsed()),
        Ok(Ok(false)) => ServiceCheck::unhealthy("Service reported unhealthy"),
        Ok(Err(e)) => ServiceCheck::unhealthy(e.to_string()),
        Err(_) => ServiceCheck::unhealthy(format!(
            "Health check timed out after {}ms",
            timeout.as_millis()
        )),
    }
}

fn emotion_list(emotions: &[EmotionId]) -> String {
    emotions
        .iter()
        .map(|e| e.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn prompt_preview(prompt: &str) -> String {
    prompt.chars().take(PROMPT_LOG_CHARS).collect()
}
