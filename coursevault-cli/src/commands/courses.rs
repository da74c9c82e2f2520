//! `coursevault courses`: active courses, with the selection marked.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use coursevault_canvas::LmsClient;

use super::{canvas_client, home, load_settings};

#[derive(Args, Debug)]
pub struct CoursesArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize, Tabled)]
struct CourseRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "name")]
    name: String,
    #[tabled(rename = "code")]
    code: String,
    #[tabled(rename = "selected")]
    #[serde(skip)]
    marker: &'static str,
    #[tabled(skip)]
    selected: bool,
}

impl CoursesArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let settings = load_settings(&home)?;
        let client = canvas_client(&home, &settings)?;

        let courses = client
            .list_active_courses()
            .context("failed to list active courses")?;
        let rows: Vec<CourseRow> = courses
            .into_iter()
            .map(|course| {
                let selected = settings
                    .selected_courses
                    .iter()
                    .any(|s| s.course_id == course.id);
                CourseRow {
                    id: course.id.to_string(),
                    name: course.display_name(),
                    code: course.course_code.clone().unwrap_or_default(),
                    marker: if selected { "*" } else { "" },
                    selected,
                }
            })
            .collect();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&rows).context("failed to serialize courses")?
            );
            return Ok(());
        }
        if rows.is_empty() {
            println!("No active courses.");
            return Ok(());
        }
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        println!("Select with `coursevault select <id>...`.");
        Ok(())
    }
}
