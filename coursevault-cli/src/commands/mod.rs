pub mod config;
pub mod courses;
pub mod daemon;
pub mod diff;
pub mod forget;
pub mod init;
pub mod select;
pub mod status;
pub mod sync;
pub mod todo;
pub mod token;

use std::path::PathBuf;

use anyhow::{Context, Result};

use coursevault_canvas::CanvasClient;
use coursevault_core::{credentials, settings, Settings};

pub(crate) fn home() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

pub(crate) fn load_settings(home: &std::path::Path) -> Result<Settings> {
    settings::load_at(home).context("failed to load settings")
}

/// Authenticated client for the configured Canvas instance.
pub(crate) fn canvas_client(home: &std::path::Path, settings: &Settings) -> Result<CanvasClient> {
    let token = credentials::require_token_at(home)?;
    CanvasClient::new(&settings.canvas_url, &token)
        .with_context(|| format!("invalid canvas_url '{}'", settings.canvas_url))
}
