//! `coursevault init [--canvas-url <url>] [--vault <path>]`

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use coursevault_core::settings;
use coursevault_sync::paths::state_dir;

use super::{home, load_settings};

/// Create or update the settings file and make sure the vault exists.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Base URL of the Canvas instance, e.g. https://canvas.illinois.edu
    #[arg(long)]
    pub canvas_url: Option<String>,

    /// Vault directory. Defaults to ~/CourseVault.
    #[arg(long)]
    pub vault: Option<PathBuf>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let mut settings = load_settings(&home)?;

        if let Some(url) = &self.canvas_url {
            settings.set("canvas_url", url)?;
        }
        if let Some(vault) = &self.vault {
            let vault = if vault.is_absolute() {
                vault.clone()
            } else {
                std::env::current_dir()
                    .context("cannot resolve current directory")?
                    .join(vault)
            };
            settings.vault_path = Some(vault);
        }

        let vault = settings.vault_path_or_default(&home);
        let state = state_dir(&vault);
        fs::create_dir_all(&state).with_context(|| format!("cannot create {}", state.display()))?;
        settings::save_at(&home, &settings).context("failed to save settings")?;

        println!("✓ Settings saved to {}", settings::settings_path_at(&home).display());
        println!("  Canvas: {}", settings.canvas_url);
        println!("  Vault:  {}", vault.display());
        println!("Next: `coursevault token set <token>`, then `coursevault select <course-id>...`");
        Ok(())
    }
}
