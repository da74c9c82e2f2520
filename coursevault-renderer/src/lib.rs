//! # coursevault-renderer
//!
//! Turns remote items into vault artifacts: a sorted YAML metadata header
//! followed by a Markdown body rendered from embedded Tera templates.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chrono::Utc;
//! use coursevault_core::{Course, RemoteItem};
//! use coursevault_renderer::Renderer;
//!
//! fn render(item: &RemoteItem, course: &Course) -> Option<String> {
//!     let renderer = Renderer::new().ok()?;
//!     renderer.render_item(item, course, Utc::now()).ok()
//! }
//! ```

pub mod context;
pub mod dates;
pub mod engine;
pub mod error;
pub mod status;
pub mod text;

pub use context::{Header, TaskLine};
pub use engine::{compose_artifact, template_name, Renderer, TemplateEngine};
pub use error::RenderError;
pub use status::{derive_status, AssignmentStatus};
pub use text::html_to_markdown;
