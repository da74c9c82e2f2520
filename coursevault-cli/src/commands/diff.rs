//! `coursevault diff <kind> <id>`: unified diff of one artifact against a fresh render.

use anyhow::{Context, Result};
use clap::Args;

use coursevault_core::{ItemId, ItemKind};
use coursevault_sync::diff_artifact;

use super::{canvas_client, home, load_settings};

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// assignment, calendar_event, page, or external_link.
    pub kind: ItemKind,

    /// Remote id, as shown by `coursevault status`.
    pub id: String,
}

impl DiffArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let settings = load_settings(&home)?;
        let vault = settings.vault_path_or_default(&home);
        let client = canvas_client(&home, &settings)?;
        let id = ItemId::from(self.id);

        let diff = diff_artifact(&vault, &client, self.kind, &id)
            .with_context(|| format!("diff failed for {} {}", self.kind, id))?;

        match diff {
            None => println!("No differences for {} {}.", self.kind, id),
            Some(diff) => {
                print!("{}", diff.unified_diff);
                if !diff.unified_diff.ends_with('\n') {
                    println!();
                }
            }
        }
        Ok(())
    }
}
