//! Moodscape Engine - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moodscape_engine::api;
use moodscape_engine::app::App;
use moodscape_engine::infrastructure::{
    comfyui::ComfyUIClient,
    config::AppConfig,
    ollama::OllamaClient,
    ports::{ImageGenPort, LlmPort},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root (the engine is usually run from `crates/engine`).
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "moodscape_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Moodscape Engine");

    let config = AppConfig::from_env()?;

    let llm: Option<Arc<dyn LlmPort>> = match &config.ollama_base_url {
        Some(url) => {
            tracing::info!(url = %url, model = %config.ollama_model, "Text model configured");
            let client: Arc<dyn LlmPort> = Arc::new(OllamaClient::new(url, &config.ollama_model));
            Some(client)
        }
        None => {
            tracing::warn!("OLLAMA_BASE_URL not set, story analysis will use local fallback");
            None
        }
    };

    let image_gen: Option<Arc<dyn ImageGenPort>> = match &config.comfyui_base_url {
        Some(url) => {
            tracing::info!(
                url = %url,
                max_retries = config.generation.max_retries,
                timeout_secs = config.generation.attempt_timeout.as_secs(),
                base_backoff_ms = config.generation.base_backoff.as_millis() as u64,
                "Image service configured"
            );
            let client: Arc<dyn ImageGenPort> = Arc::new(ComfyUIClient::new(url));
            Some(client)
        }
        None => {
            tracing::warn!("COMFYUI_BASE_URL not set, serving placeholder images");
            None
        }
    };

    let app = Arc::new(App::new(llm, image_gen, &config));

    let mut router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = build_cors_layer(&config.cors_allowed_origins) {
        router = router.layer(cors);
    }

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}

fn build_cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    if allowed_origins.is_empty() {
        return None;
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    if allowed_origins.iter().any(|o| o == "*") {
        return Some(cors.allow_origin(Any));
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|s| HeaderValue::from_str(s).ok())
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(cors.allow_origin(origins))
}
