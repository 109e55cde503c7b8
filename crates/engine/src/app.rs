//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use crate::infrastructure::{
    config::AppConfig,
    ports::{ImageGenPort, LlmPort},
    resilient_image::GenerationClient,
};
use crate::use_cases::visualization::{
    CheckServices, ListEmotions, StoryAnalyzer, VisualizationUseCases, VisualizeFeeling,
    VisualizeStory,
};

/// Limit for a single service health probe
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub use_cases: UseCases,
}

/// Container for all use cases.
pub struct UseCases {
    pub visualization: VisualizationUseCases,
}

impl App {
    /// Create a new App with all dependencies wired up.
    ///
    /// Either port may be absent: without an image service every request is
    /// answered with a placeholder, without a text model narrative analysis
    /// uses its local fallback.
    pub fn new(
        llm: Option<Arc<dyn LlmPort>>,
        image_gen: Option<Arc<dyn ImageGenPort>>,
        config: &AppConfig,
    ) -> Self {
        let client = Arc::new(GenerationClient::new(
            image_gen.clone(),
            config.generation.clone(),
            config.image_size,
        ));
        let analyzer = Arc::new(StoryAnalyzer::new(llm.clone(), config.analysis_timeout));

        let visualization = VisualizationUseCases::new(
            Arc::new(VisualizeFeeling::new(client.clone())),
            Arc::new(VisualizeStory::new(analyzer, client)),
            Arc::new(ListEmotions),
            Arc::new(CheckServices::new(image_gen, llm, HEALTH_CHECK_TIMEOUT)),
        );

        Self {
            use_cases: UseCases { visualization },
        }
    }
}
