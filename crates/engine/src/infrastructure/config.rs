//! Application configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::infrastructure::ollama::DEFAULT_OLLAMA_MODEL;
use crate::infrastructure::placeholder::{MAX_SIZE, MIN_SIZE};
use crate::infrastructure::resilient_image::RetryPolicy;

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,

    /// CORS allowed origins ("*" for any)
    pub cors_allowed_origins: Vec<String>,

    /// Ollama API base URL; unset means narrative analysis always falls back
    pub ollama_base_url: Option<String>,
    pub ollama_model: String,

    /// ComfyUI server URL; unset means placeholder images
    pub comfyui_base_url: Option<String>,

    /// Edge length of generated square images
    pub image_size: u32,

    pub generation: RetryPolicy,

    /// Limit for one narrative analysis call
    pub analysis_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let image_size: u32 = parse_or(&get, "IMAGE_SIZE", 512)?;
        if !(MIN_SIZE..=MAX_SIZE).contains(&image_size) {
            anyhow::bail!("IMAGE_SIZE must be between {MIN_SIZE} and {MAX_SIZE}, got {image_size}");
        }

        Ok(Self {
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            server_port: parse_or(&get, "SERVER_PORT", 3000)?,

            cors_allowed_origins: get("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| "*".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),

            ollama_base_url: get("OLLAMA_BASE_URL"),
            ollama_model: get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string()),

            comfyui_base_url: get("COMFYUI_BASE_URL"),

            image_size,

            generation: RetryPolicy {
                max_retries: parse_or(&get, "GENERATION_MAX_RETRIES", 2)?,
                attempt_timeout: Duration::from_secs(parse_or(
                    &get,
                    "GENERATION_TIMEOUT_SECS",
                    30,
                )?),
                base_backoff: Duration::from_millis(parse_or(&get, "GENERATION_BACKOFF_MS", 1000)?),
            },

            analysis_timeout: Duration::from_secs(parse_or(&get, "ANALYSIS_TIMEOUT_SECS", 30)?),
        })
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("{key} must be a valid number, got {raw:?}")),
        None => Ok(default),
    }
}
