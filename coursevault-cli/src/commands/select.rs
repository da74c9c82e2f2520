//! `coursevault select <course-id>...`: replace the course selection.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use clap::Args;

use coursevault_canvas::LmsClient;
use coursevault_core::{settings, CourseId};

use super::{canvas_client, home, load_settings};

#[derive(Args, Debug)]
pub struct SelectArgs {
    /// Course ids as listed by `coursevault courses`. Replaces the selection.
    #[arg(required_unless_present = "clear", conflicts_with = "clear")]
    pub course_ids: Vec<String>,

    /// Deselect every course.
    #[arg(long)]
    pub clear: bool,
}

impl SelectArgs {
    pub fn run(self) -> Result<()> {
        let home = home()?;
        let mut settings = load_settings(&home)?;

        if self.clear {
            settings.set_selected_courses(Vec::new());
            settings::save_at(&home, &settings).context("failed to save settings")?;
            println!("✓ Selection cleared");
            return Ok(());
        }

        let client = canvas_client(&home, &settings)?;
        let active: HashMap<CourseId, String> = client
            .list_active_courses()
            .context("failed to list active courses")?
            .into_iter()
            .map(|c| {
                let name = c.display_name();
                (c.id, name)
            })
            .collect();

        let mut chosen = Vec::new();
        let mut unknown = Vec::new();
        for raw in &self.course_ids {
            let id = CourseId::from(raw.trim());
            match active.get(&id) {
                Some(name) if !chosen.iter().any(|(c, _)| c == &id) => {
                    chosen.push((id, name.clone()))
                }
                Some(_) => {}
                None => unknown.push(raw.as_str()),
            }
        }
        if !unknown.is_empty() {
            bail!(
                "not an active course: {} (see `coursevault courses`)",
                unknown.join(", ")
            );
        }

        settings.set_selected_courses(chosen);
        settings::save_at(&home, &settings).context("failed to save settings")?;
        println!("✓ {} course(s) selected", settings.selected_courses.len());
        for course in &settings.selected_courses {
            println!("  {} {}", course.course_id, course.course_name);
        }
        Ok(())
    }
}
