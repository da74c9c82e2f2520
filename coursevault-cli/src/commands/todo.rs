//! `coursevault todo`: print the generated task list.

use std::io::ErrorKind;

use anyhow::{Context, Result};
use clap::Args;

use coursevault_sync::tasks::task_list_path;

use super::{home, load_settings};

#[derive(Args, Debug)]
pub struct TodoArgs {
    /// Print the file's path instead of its contents.
    #[arg(long)]
    pub path: bool,
}

impl TodoArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let settings = load_settings(&home)?;
        let path = task_list_path(&settings.vault_path_or_default(&home));

        if self.path {
            println!("{}", path.display());
            return Ok(());
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => print!("{text}"),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                if settings.generate_todo {
                    println!("No task list yet. Run `coursevault sync`.");
                } else {
                    println!("Task list generation is off (`coursevault config set generate_todo true`).");
                }
            }
            Err(err) => {
                return Err(err).with_context(|| format!("cannot read {}", path.display()));
            }
        }
        Ok(())
    }
}
