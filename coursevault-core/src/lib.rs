//! coursevault core library: domain types, settings, credentials, errors.
//!
//! - [`types`]: newtypes and the tagged [`RemoteItem`] set
//! - [`settings`]: `~/.coursevault/config.yaml` load / save
//! - [`credentials`]: the Canvas API token
//! - [`state`]: sync records and run reports
//! - [`timestamp`]: remote timestamp normalization
//! - [`error`]: [`ConfigError`]

pub mod credentials;
pub mod error;
pub mod settings;
pub mod state;
pub mod timestamp;
pub mod types;

pub use error::ConfigError;
pub use settings::{ScrapeSource, SelectedCourse, Settings};
pub use state::{SyncRecord, SyncReport};
pub use types::{
    Assignment, CalendarEvent, Course, CourseId, ExternalLink, ItemId, ItemKind, Page,
    RemoteFile, RemoteItem, Submission,
};
