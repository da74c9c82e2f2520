//! Template contexts and the metadata header for each item kind.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_yaml::Value;

use coursevault_core::{
    Assignment, CalendarEvent, Course, ExternalLink, ItemId, ItemKind, Page,
};

use crate::dates::{format_due_date, format_event_time, is_all_day};
use crate::error::RenderError;
use crate::status::derive_status;
use crate::text::html_to_markdown;

pub const NO_DESCRIPTION: &str = "No description provided.";
pub const NO_LOCATION: &str = "Not specified";
pub const EMPTY_PAGE: &str = "This page has no content.";

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// YAML frontmatter fields, emitted in sorted key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    fields: BTreeMap<String, Value>,
}

impl Header {
    /// Header with the fields every item artifact carries.
    pub fn for_item(kind: ItemKind, course: &Course, id: &ItemId, rendered_at: DateTime<Utc>) -> Self {
        let mut header = Header::default();
        header.insert("type", kind.as_str());
        header.insert("course", course.display_name());
        header.insert("course_id", course.id.0.as_str());
        header.insert("canvas_id", id.0.as_str());
        header.insert("synced_at", rfc3339(rendered_at));
        header
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Absent values are written as `null` so every kind has a fixed key set.
    pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        self.fields
            .insert(key.to_string(), value.map_or(Value::Null, Into::into));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn to_yaml(&self) -> Result<String, RenderError> {
        Ok(serde_yaml::to_string(&self.fields)?)
    }
}

pub(crate) fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn rich_text_or(html: Option<&str>, fallback: &str) -> String {
    let md = html.map(html_to_markdown).unwrap_or_default();
    if md.is_empty() {
        fallback.to_string()
    } else {
        md
    }
}

// ---------------------------------------------------------------------------
// Per-kind contexts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentCtx {
    pub title: String,
    pub description: String,
    pub due: String,
    pub points: String,
    pub submission_types: String,
    pub url: Option<String>,
}

/// `Ungraded` for absent or zero points; whole numbers without a fraction.
pub fn format_points(points: Option<f64>) -> String {
    match points {
        None => "Ungraded".to_string(),
        Some(p) if p == 0.0 => "Ungraded".to_string(),
        Some(p) if p.fract() == 0.0 => format!("{p:.0}"),
        Some(p) => p.to_string(),
    }
}

pub fn assignment_context(a: &Assignment) -> AssignmentCtx {
    AssignmentCtx {
        title: a.name.clone(),
        description: rich_text_or(a.description.as_deref(), NO_DESCRIPTION),
        due: format_due_date(a.due_at.as_deref()),
        points: format_points(a.points_possible),
        submission_types: if a.submission_types.is_empty() {
            "None".to_string()
        } else {
            a.submission_types.join(", ")
        },
        url: a.html_url.clone(),
    }
}

pub fn assignment_header(a: &Assignment, course: &Course, rendered_at: DateTime<Utc>) -> Header {
    let mut h = Header::for_item(ItemKind::Assignment, course, &a.id, rendered_at);
    h.insert_opt("due", a.due_at.clone());
    h.insert_opt("points", a.points_possible);
    h.insert("status", derive_status(a.submission.as_ref()).as_str());
    h.insert_opt("url", a.html_url.clone());
    h
}

#[derive(Debug, Clone, Serialize)]
pub struct EventCtx {
    pub title: String,
    pub when: String,
    pub location: String,
    pub description: String,
    pub url: Option<String>,
}

pub fn event_context(e: &CalendarEvent) -> EventCtx {
    EventCtx {
        title: e.title.clone(),
        when: format_event_time(e.start_at.as_deref(), e.end_at.as_deref()),
        location: e
            .location_name
            .clone()
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| NO_LOCATION.to_string()),
        description: rich_text_or(e.description.as_deref(), NO_DESCRIPTION),
        url: e.html_url.clone(),
    }
}

pub fn event_header(e: &CalendarEvent, course: &Course, rendered_at: DateTime<Utc>) -> Header {
    let mut h = Header::for_item(ItemKind::CalendarEvent, course, &e.id, rendered_at);
    h.insert_opt("start", e.start_at.clone());
    h.insert_opt("end", e.end_at.clone());
    h.insert("all_day", is_all_day(e.start_at.as_deref()));
    h.insert_opt("location", e.location_name.clone());
    h.insert_opt("url", e.html_url.clone());
    h
}

#[derive(Debug, Clone, Serialize)]
pub struct PageCtx {
    pub title: String,
    pub module: String,
    pub body: String,
    pub url: Option<String>,
}

pub fn page_context(p: &Page) -> PageCtx {
    PageCtx {
        title: p.title.clone(),
        module: p.module_name.clone(),
        body: rich_text_or(p.body.as_deref(), EMPTY_PAGE),
        url: p.html_url.clone(),
    }
}

pub fn page_header(p: &Page, course: &Course, rendered_at: DateTime<Utc>) -> Header {
    let mut h = Header::for_item(ItemKind::Page, course, &p.id, rendered_at);
    h.insert("module", p.module_name.as_str());
    h.insert_opt("url", p.html_url.clone());
    h
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkCtx {
    pub title: String,
    pub module: String,
    pub url: String,
}

pub fn link_context(l: &ExternalLink) -> LinkCtx {
    LinkCtx {
        title: l.title.clone(),
        module: l.module_name.clone(),
        url: l.url.clone(),
    }
}

pub fn link_header(l: &ExternalLink, course: &Course, rendered_at: DateTime<Utc>) -> Header {
    let mut h = Header::for_item(ItemKind::ExternalLink, course, &l.id, rendered_at);
    h.insert("module", l.module_name.as_str());
    h.insert("url", l.url.as_str());
    h
}

// ---------------------------------------------------------------------------
// Task list
// ---------------------------------------------------------------------------

/// One rendered line of the task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskLine {
    pub done: bool,
    pub course: String,
    pub name: String,
    /// Already formatted for display.
    pub due: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskListCtx {
    pub generated: String,
    pub tasks: Vec<TaskLine>,
}

pub fn task_list_header(task_count: usize, rendered_at: DateTime<Utc>) -> Header {
    let mut h = Header::default();
    h.insert("type", "todo_master");
    h.insert("tasks", task_count as u64);
    h.insert("synced_at", rfc3339(rendered_at));
    h
}
