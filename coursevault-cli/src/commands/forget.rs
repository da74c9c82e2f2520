//! `coursevault forget <kind> <id>`

use anyhow::{Context, Result};
use clap::Args;

use coursevault_core::{ItemId, ItemKind};
use coursevault_sync::forget;

use super::{home, load_settings};

/// Drop one sync record. The artifact stays on disk; the next sync treats it
/// as unrecorded and rewrites it from the remote.
#[derive(Args, Debug)]
pub struct ForgetArgs {
    pub kind: ItemKind,
    pub id: String,
}

impl ForgetArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let vault = load_settings(&home)?.vault_path_or_default(&home);
        let id = ItemId::from(self.id);

        let record = forget(&vault, self.kind, &id)
            .with_context(|| format!("cannot forget {} {}", self.kind, id))?;
        println!(
            "✓ Forgot {} {}; {} will be replaced on the next sync",
            record.kind, record.remote_id, record.artifact_path
        );
        Ok(())
    }
}
