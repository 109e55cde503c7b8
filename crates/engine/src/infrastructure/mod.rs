//! Infrastructure implementations.
//!
//! Contains port trait implementations for external services, the retrying
//! image client and the procedural placeholder renderer.

pub mod comfyui;
pub mod config;
pub mod ollama;
pub mod placeholder;
pub mod ports;
pub mod resilient_image;
