//! # coursevault-canvas
//!
//! Remote side of the sync: the [`LmsClient`] trait, its Canvas REST
//! implementation over `ureq`, rate-limit backoff, and the link scraper that
//! feeds extra tasks into the task list.

pub mod backoff;
pub mod client;
pub mod error;
pub mod models;
pub mod scrape;
pub mod urls;

pub use backoff::{with_backoff, with_backoff_using, MAX_ATTEMPTS};
pub use client::{CanvasClient, LmsClient};
pub use error::CanvasError;
pub use models::{Folder, Module, ModuleItem, WikiPage};
pub use scrape::{parse_task_links, HttpScraper, ScrapedTask, TaskScraper};
pub use urls::{is_allowed_url, is_http_url};
