//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - LLM calls (could swap Ollama -> Claude/OpenAI)
//! - Image generation (could swap ComfyUI -> other)

mod error;
mod external;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ChatMessage, FinishReason, ImageGenPort, ImageRequest, ImageResult, LlmPort, LlmRequest,
    LlmResponse, MessageRole, TokenUsage,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockImageGenPort, MockLlmPort};

// =============================================================================
// Error Types
// =============================================================================
pub use error::{FailureClass, ImageGenError, LlmError};
