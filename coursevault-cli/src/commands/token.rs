//! `coursevault token set <token>` and `coursevault token status`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use coursevault_core::credentials::{self, TOKEN_ENV};

use super::home;

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Store the API token (generated under Canvas → Account → Settings).
    Set(SetTokenArgs),
    /// Report whether a token is configured and where it comes from.
    Status,
}

#[derive(Args, Debug)]
pub struct SetTokenArgs {
    pub token: String,
}

pub fn run(command: TokenCommand) -> Result<()> {
    let home = home()?;
    match command {
        TokenCommand::Set(args) => {
            credentials::set_token_at(&home, &args.token).context("failed to store token")?;
            println!(
                "✓ Token saved to {}",
                credentials::token_path_at(&home).display()
            );
        }
        TokenCommand::Status => {
            let from_env = std::env::var(TOKEN_ENV)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            if from_env {
                println!("token: set via {TOKEN_ENV}");
            } else if credentials::read_token_file_at(&home)?.is_some() {
                println!(
                    "token: stored in {}",
                    credentials::token_path_at(&home).display()
                );
            } else {
                println!("token: not configured");
            }
        }
    }
    Ok(())
}
