//! Moodscape Engine library.
//!
//! Turns a mood description (category, emotions, optional narrative) into an
//! illustrative image, with narrative analysis for stories.
//!
//! ## Structure
//!
//! - `use_cases/` - Visualization orchestration
//! - `infrastructure/` - External service adapters, retrying image client, placeholder renderer
//! - `api/` - HTTP entry points
//! - `app` - Application composition

pub mod api;
pub mod app;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
