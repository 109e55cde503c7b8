//! ComfyUI image generation client
//!
//! Implements the ImageGenPort trait against ComfyUI's queue/history API.
//! Retry and timeout policy live in the resilient client, not here.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::sleep;

use crate::infrastructure::ports::{ImageGenError, ImageGenPort, ImageRequest, ImageResult};

/// Negative prompt applied to every workflow
pub const NEGATIVE_PROMPT: &str =
    "bad quality, blurry, distorted, text artifacts, watermark, photorealistic faces";

const CHECKPOINT: &str = "v1-5-pruned-emaonly.ckpt";
const FILENAME_PREFIX: &str = "moodscape";
const HISTORY_POLL_INTERVAL: Duration = Duration::from_secs(1);
const HISTORY_MAX_POLLS: u32 = 120;

/// Client for ComfyUI API
#[derive(Clone)]
pub struct ComfyUIClient {
    client: Client,
    base_url: String,
}

impl ComfyUIClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Queue a workflow for execution
    async fn queue_prompt(
        &self,
        workflow: serde_json::Value,
    ) -> Result<QueueResponse, ImageGenError> {
        let request = QueuePromptRequest {
            prompt: workflow,
            client_id: uuid::Uuid::new_v4().to_string(),
        };

        let response = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))
    }

    async fn get_history(&self, prompt_id: &str) -> Result<HistoryResponse, ImageGenError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.base_url, prompt_id))
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))
    }

    async fn get_image(&self, output: &ImageOutput) -> Result<Vec<u8>, ImageGenError> {
        let response = self
            .client
            .get(format!("{}/view", self.base_url))
            .query(&[
                ("filename", output.filename.as_str()),
                ("subfolder", output.subfolder.as_str()),
                ("type", output.r#type.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        ensure_success(response)
            .await?
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))
    }

    /// Poll history until the prompt completes, returning its first image
    async fn wait_for_completion(&self, prompt_id: &str) -> Result<ImageOutput, ImageGenError> {
        for _ in 0..HISTORY_MAX_POLLS {
            let history = self.get_history(prompt_id).await?;
            if let Some(found) = first_image(&history, prompt_id)? {
                return Ok(found);
            }
            sleep(HISTORY_POLL_INTERVAL).await;
        }

        Err(ImageGenError::GenerationFailed(
            "Generation timed out waiting for history".to_string(),
        ))
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ImageGenError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(status_error(status, &error_text))
}

/// Rejected credentials are a setup problem; any other status is left to the
/// message classifier.
fn status_error(status: StatusCode, body: &str) -> ImageGenError {
    let message = format!("{}: {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ImageGenError::Configuration(message),
        _ => ImageGenError::GenerationFailed(message),
    }
}

/// `Ok(None)` while the prompt is still running.
fn first_image(
    history: &HistoryResponse,
    prompt_id: &str,
) -> Result<Option<ImageOutput>, ImageGenError> {
    let Some(entry) = history.prompts.get(prompt_id) else {
        return Ok(None);
    };
    if entry.status.status_str == "error" {
        return Err(ImageGenError::GenerationFailed(format!(
            "Workflow {} failed",
            prompt_id
        )));
    }
    if !entry.status.completed {
        return Ok(None);
    }

    // Node ids are numeric strings; pick the lowest so the choice is stable.
    let mut nodes: Vec<(&String, &NodeOutput)> = entry.outputs.iter().collect();
    nodes.sort_by_key(|(id, _)| id.parse::<u64>().unwrap_or(u64::MAX));
    nodes
        .into_iter()
        .find_map(|(_, output)| output.images.as_ref().and_then(|i| i.first()).cloned())
        .map(Some)
        .ok_or_else(|| ImageGenError::GenerationFailed("No images in output".to_string()))
}

fn format_from_filename(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "jpeg"
    } else if lower.ends_with(".webp") {
        "webp"
    } else {
        "png"
    }
}

/// Text-to-image workflow for a single square render
fn build_workflow(request: &ImageRequest, seed: u32) -> serde_json::Value {
    serde_json::json!({
        "3": {
            "inputs": {
                "seed": seed,
                "steps": 20,
                "cfg": 7.0,
                "sampler_name": "euler",
                "scheduler": "normal",
                "denoise": 1.0,
                "model": ["4", 0],
                "positive": ["6", 0],
                "negative": ["7", 0],
                "latent_image": ["5", 0]
            },
            "class_type": "KSampler"
        },
        "4": {
            "inputs": { "ckpt_name": CHECKPOINT },
            "class_type": "CheckpointLoaderSimple"
        },
        "5": {
            "inputs": {
                "width": request.width,
                "height": request.height,
                "batch_size": 1
            },
            "class_type": "EmptyLatentImage"
        },
        "6": {
            "inputs": { "text": request.prompt, "clip": ["4", 1] },
            "class_type": "CLIPTextEncode"
        },
        "7": {
            "inputs": { "text": NEGATIVE_PROMPT, "clip": ["4", 1] },
            "class_type": "CLIPTextEncode"
        },
        "8": {
            "inputs": { "samples": ["3", 0], "vae": ["4", 2] },
            "class_type": "VAEDecode"
        },
        "9": {
            "inputs": { "filename_prefix": FILENAME_PREFIX, "images": ["8", 0] },
            "class_type": "SaveImage"
        }
    })
}

#[async_trait]
impl ImageGenPort for ComfyUIClient {
    async fn generate(&self, request: ImageRequest) -> Result<ImageResult, ImageGenError> {
        let workflow = build_workflow(&request, rand::random::<u32>());
        let queued = self.queue_prompt(workflow).await?;
        tracing::debug!(prompt_id = %queued.prompt_id, "Workflow queued");

        let output = self.wait_for_completion(&queued.prompt_id).await?;
        let image_data = self.get_image(&output).await?;

        Ok(ImageResult {
            image_data,
            format: format_from_filename(&output.filename).to_string(),
        })
    }

    async fn check_health(&self) -> Result<bool, ImageGenError> {
        let response = self
            .client
            .get(format!("{}/system_stats", self.base_url))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| ImageGenError::GenerationFailed(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// =============================================================================
// ComfyUI API types
// =============================================================================

#[derive(Debug, Serialize)]
struct QueuePromptRequest {
    prompt: serde_json::Value,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct QueueResponse {
    prompt_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(flatten)]
    prompts: HashMap<String, PromptHistory>,
}

#[derive(Debug, Deserialize)]
struct PromptHistory {
    #[serde(default)]
    outputs: HashMap<String, NodeOutput>,
    status: PromptStatus,
}

#[derive(Debug, Deserialize)]
struct NodeOutput {
    images: Option<Vec<ImageOutput>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ImageOutput {
    filename: String,
    #[serde(default)]
    subfolder: String,
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct PromptStatus {
    #[serde(default)]
    status_str: String,
    completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(raw: &str) -> HistoryResponse {
        serde_json::from_str(raw).expect("valid history")
    }

    #[test]
    fn workflow_carries_prompt_size_and_seed() {
        let request = ImageRequest::square("soft watercolor clouds", 512);
        let workflow = build_workflow(&request, 42);
        assert_eq!(workflow["3"]["inputs"]["seed"], 42);
        assert_eq!(workflow["5"]["inputs"]["width"], 512);
        assert_eq!(workflow["5"]["inputs"]["height"], 512);
        assert_eq!(workflow["6"]["inputs"]["text"], "soft watercolor clouds");
        assert_eq!(workflow["7"]["inputs"]["text"], NEGATIVE_PROMPT);
    }

    #[test]
    fn pending_prompt_yields_nothing_yet() {
        let h = history(r#"{"abc": {"outputs": {}, "status": {"status_str": "running", "completed": false}}}"#);
        assert!(first_image(&h, "abc").expect("not an error").is_none());
        assert!(first_image(&history("{}"), "abc").expect("not an error").is_none());
    }

    #[test]
    fn completed_prompt_returns_lowest_node_image() {
        let h = history(
            r#"{"abc": {
                "outputs": {
                    "12": {"images": [{"filename": "late.png", "subfolder": "", "type": "output"}]},
                    "9": {"images": [{"filename": "moodscape_00001_.png", "subfolder": "", "type": "output"}]}
                },
                "status": {"status_str": "success", "completed": true}
            }}"#,
        );
        let image = first_image(&h, "abc").expect("ok").expect("image");
        assert_eq!(image.filename, "moodscape_00001_.png");
        assert_eq!(image.r#type, "output");
    }

    #[test]
    fn failed_or_empty_workflows_are_errors() {
        let failed = history(r#"{"abc": {"outputs": {}, "status": {"status_str": "error", "completed": false}}}"#);
        assert!(matches!(
            first_image(&failed, "abc"),
            Err(ImageGenError::GenerationFailed(_))
        ));

        let empty = history(r#"{"abc": {"outputs": {"9": {}}, "status": {"status_str": "success", "completed": true}}}"#);
        assert!(first_image(&empty, "abc").is_err());
    }

    #[test]
    fn rejected_credentials_map_to_configuration() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, "missing token"),
            ImageGenError::Configuration(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, ""),
            ImageGenError::Configuration(_)
        ));
    }

    #[test]
    fn other_statuses_stay_retryable() {
        let error = status_error(StatusCode::BAD_GATEWAY, "upstream 4013 down");
        assert!(matches!(error, ImageGenError::GenerationFailed(_)));
        assert!(!error.class().is_terminal());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(format_from_filename("a.PNG"), "png");
        assert_eq!(format_from_filename("a.jpeg"), "jpeg");
        assert_eq!(format_from_filename("a.webp"), "webp");
        assert_eq!(format_from_filename("noext"), "png");
    }
}
