//! Tera rendering engine: [`TemplateEngine`] and [`Renderer`].
//!
//! # Artifact layout
//!
//! ```text
//! ---
//! <sorted YAML header>
//! ---
//!
//! <template body>
//! ```
//!
//! | Kind            | Template                    |
//! |-----------------|-----------------------------|
//! | Assignment      | `assignment.md.tera`        |
//! | Calendar event  | `calendar_event.md.tera`    |
//! | Page            | `page.md.tera`              |
//! | External link   | `external_link.md.tera`     |
//! | Task list       | `todo.md.tera`              |
//!
//! Files are mirrored byte-for-byte and never pass through here.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::{Context, Tera};

use coursevault_core::{Course, ItemKind, RemoteItem};

use crate::context::{self, Header, TaskLine, TaskListCtx};
use crate::error::RenderError;

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

const TPLS: &[(&str, &str)] = &[
    ("assignment.md.tera", include_str!("templates/assignment.md.tera")),
    ("calendar_event.md.tera", include_str!("templates/calendar_event.md.tera")),
    ("page.md.tera", include_str!("templates/page.md.tera")),
    ("external_link.md.tera", include_str!("templates/external_link.md.tera")),
    ("todo.md.tera", include_str!("templates/todo.md.tera")),
];

pub const TASK_LIST_TEMPLATE: &str = "todo.md.tera";

/// Template used for a kind, `None` for kinds that are not rendered as text.
pub fn template_name(kind: ItemKind) -> Option<&'static str> {
    match kind {
        ItemKind::Assignment => Some("assignment.md.tera"),
        ItemKind::CalendarEvent => Some("calendar_event.md.tera"),
        ItemKind::Page => Some("page.md.tera"),
        ItemKind::ExternalLink => Some("external_link.md.tera"),
        ItemKind::File => None,
    }
}

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RenderError {
    RenderError::Io { path: path.into(), source }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

/// Top-level `*.tera` files in `dir`; a missing directory has no overrides.
fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, RenderError> {
    if !dir.is_dir() {
        return Ok(vec![]);
    }
    let mut templates = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let path = entry.map_err(|e| io_err(dir, e))?.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let name = normalize_template_name(Path::new(file_name));
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let mut templates: HashMap<String, String> = TPLS
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect();
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera engine with embedded templates and optional same-named overrides.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(TemplateEngine { tera: build_tera(user_template_dir)? })
    }

    /// Render `name` with a serializable context; output always uses LF.
    pub fn render<C: Serialize>(&self, name: &str, ctx: &C) -> Result<String, RenderError> {
        let tera_ctx = Context::from_value(serde_json::to_value(ctx)?)?;
        let out = self.tera.render(name, &tera_ctx)?;
        Ok(out.replace("\r\n", "\n"))
    }
}

/// `---\n<header>---\n\n<body>`, with exactly one trailing newline.
pub fn compose_artifact(header: &Header, body: &str) -> Result<String, RenderError> {
    let yaml = header.to_yaml()?;
    Ok(format!("---\n{yaml}---\n\n{}\n", body.trim_end()))
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renders remote items and the task list into complete artifact text.
///
/// Create once per run and reuse.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(None)? })
    }

    /// Embedded templates, overridden by same-named files in `dir`.
    pub fn with_template_dir(dir: &Path) -> Result<Self, RenderError> {
        Ok(Renderer { engine: TemplateEngine::new(Some(dir))? })
    }

    /// Full artifact text (header + body) for one item.
    pub fn render_item(
        &self,
        item: &RemoteItem,
        course: &Course,
        rendered_at: DateTime<Utc>,
    ) -> Result<String, RenderError> {
        let name = template_name(item.kind()).ok_or(RenderError::NotRenderable(item.kind()))?;
        let (header, body) = match item {
            RemoteItem::Assignment(a) => (
                context::assignment_header(a, course, rendered_at),
                self.engine.render(name, &context::assignment_context(a))?,
            ),
            RemoteItem::CalendarEvent(e) => (
                context::event_header(e, course, rendered_at),
                self.engine.render(name, &context::event_context(e))?,
            ),
            RemoteItem::Page(p) => (
                context::page_header(p, course, rendered_at),
                self.engine.render(name, &context::page_context(p))?,
            ),
            RemoteItem::ExternalLink(l) => (
                context::link_header(l, course, rendered_at),
                self.engine.render(name, &context::link_context(l))?,
            ),
            RemoteItem::File(_) => return Err(RenderError::NotRenderable(ItemKind::File)),
        };
        compose_artifact(&header, &body)
    }

    /// The task list document, lines already in display order.
    pub fn render_task_list(
        &self,
        tasks: &[TaskLine],
        rendered_at: DateTime<Utc>,
    ) -> Result<String, RenderError> {
        let ctx = TaskListCtx {
            generated: rendered_at.format("%B %d, %Y at %I:%M %p UTC").to_string(),
            tasks: tasks.to_vec(),
        };
        let body = self.engine.render(TASK_LIST_TEMPLATE, &ctx)?;
        compose_artifact(&context::task_list_header(tasks.len(), rendered_at), &body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
