//! `coursevault config get|set|list`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use coursevault_core::settings::{self, SETTING_KEYS};

use super::{home, load_settings};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print one setting.
    Get(GetArgs),
    /// Change one setting.
    Set(SetArgs),
    /// Print every setting and the course selection.
    List,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    pub key: String,
}

#[derive(Args, Debug)]
pub struct SetArgs {
    pub key: String,
    pub value: String,
}

pub fn run(command: ConfigCommand) -> Result<()> {
    let home = home()?;
    let mut settings = load_settings(&home)?;

    match command {
        ConfigCommand::Get(args) => println!("{}", settings.get(&args.key)?),
        ConfigCommand::Set(args) => {
            settings.set(&args.key, &args.value)?;
            settings::save_at(&home, &settings).context("failed to save settings")?;
            println!("✓ {} = {}", args.key, settings.get(&args.key)?);
        }
        ConfigCommand::List => {
            for key in SETTING_KEYS {
                println!("{key} = {}", settings.get(key)?);
            }
            println!("selected_courses = {}", settings.selected_courses.len());
            for course in &settings.selected_courses {
                println!("  {} {}", course.course_id, course.course_name);
            }
            for source in &settings.scrape_sources {
                println!("scrape_source = {} <{}>", source.label, source.url);
            }
        }
    }
    Ok(())
}
