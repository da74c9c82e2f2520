//! Domain types for remote LMS records.
//!
//! Remote items are a closed, tagged set: every kind is a plain struct with
//! explicit optional fields, wrapped by [`RemoteItem`]. Identifiers are opaque
//! strings regardless of how the remote API encodes them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier of a remote course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CourseId(pub String);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for CourseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CourseId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque identifier of a remote item, stable per remote source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub String);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// ItemKind
// ---------------------------------------------------------------------------

/// The closed set of remote item kinds mirrored into the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Assignment,
    CalendarEvent,
    Page,
    ExternalLink,
    File,
}

impl ItemKind {
    /// All kinds in a stable order.
    pub fn all() -> &'static [ItemKind] {
        &[
            ItemKind::Assignment,
            ItemKind::CalendarEvent,
            ItemKind::Page,
            ItemKind::ExternalLink,
            ItemKind::File,
        ]
    }

    /// Stable tag used in metadata headers and the sync state store.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Assignment => "assignment",
            ItemKind::CalendarEvent => "calendar_event",
            ItemKind::Page => "page",
            ItemKind::ExternalLink => "external_link",
            ItemKind::File => "file",
        }
    }

    /// Vault sub-folder (under the course folder) holding artifacts of this kind.
    pub fn folder_name(&self) -> &'static str {
        match self {
            ItemKind::Assignment => "Assignments",
            ItemKind::CalendarEvent => "Events",
            ItemKind::Page => "Pages",
            ItemKind::ExternalLink => "Links",
            ItemKind::File => "Files",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "assignment" => Ok(ItemKind::Assignment),
            "calendar_event" | "event" => Ok(ItemKind::CalendarEvent),
            "page" => Ok(ItemKind::Page),
            "external_link" | "link" => Ok(ItemKind::ExternalLink),
            "file" => Ok(ItemKind::File),
            other => Err(format!(
                "unknown item kind '{other}'; expected: assignment, calendar_event, page, external_link, file"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

/// A remote course, as much of it as rendering needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_code: Option<String>,
}

impl Course {
    /// Human name: `name`, else `course_code`, else `course_<id>`.
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.course_code.as_deref().filter(|c| !c.trim().is_empty()))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("course_{}", self.id))
    }
}

// ---------------------------------------------------------------------------
// Item kinds
// ---------------------------------------------------------------------------

/// Submission state attached to an assignment for the current user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Submission {
    pub workflow_state: Option<String>,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: ItemId,
    pub course_id: CourseId,
    pub name: String,
    pub description: Option<String>,
    pub due_at: Option<String>,
    pub points_possible: Option<f64>,
    #[serde(default)]
    pub submission_types: Vec<String>,
    pub html_url: Option<String>,
    pub updated_at: Option<String>,
    pub submission: Option<Submission>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: ItemId,
    /// Remote context, e.g. `course_42`.
    pub context_code: String,
    pub title: String,
    pub description: Option<String>,
    pub start_at: Option<String>,
    pub end_at: Option<String>,
    pub location_name: Option<String>,
    pub html_url: Option<String>,
    pub updated_at: Option<String>,
}

impl CalendarEvent {
    /// Course owning this event, when the context is a course.
    pub fn course_id(&self) -> Option<CourseId> {
        self.context_code
            .strip_prefix("course_")
            .filter(|id| !id.is_empty())
            .map(CourseId::from)
    }
}

/// A wiki page reached through a course module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: ItemId,
    pub course_id: CourseId,
    pub module_name: String,
    pub title: String,
    pub body: Option<String>,
    pub html_url: Option<String>,
    pub updated_at: Option<String>,
}

/// An external URL listed in a course module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub id: ItemId,
    pub course_id: CourseId,
    pub module_name: String,
    pub title: String,
    pub url: String,
    pub updated_at: Option<String>,
}

/// A binary course file; the artifact is the downloaded content itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: ItemId,
    pub course_id: CourseId,
    pub folder_name: String,
    pub display_name: String,
    pub url: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub updated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// RemoteItem
// ---------------------------------------------------------------------------

/// One remote record of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RemoteItem {
    Assignment(Assignment),
    CalendarEvent(CalendarEvent),
    Page(Page),
    ExternalLink(ExternalLink),
    File(RemoteFile),
}

impl RemoteItem {
    pub fn id(&self) -> &ItemId {
        match self {
            RemoteItem::Assignment(a) => &a.id,
            RemoteItem::CalendarEvent(e) => &e.id,
            RemoteItem::Page(p) => &p.id,
            RemoteItem::ExternalLink(l) => &l.id,
            RemoteItem::File(f) => &f.id,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            RemoteItem::Assignment(_) => ItemKind::Assignment,
            RemoteItem::CalendarEvent(_) => ItemKind::CalendarEvent,
            RemoteItem::Page(_) => ItemKind::Page,
            RemoteItem::ExternalLink(_) => ItemKind::ExternalLink,
            RemoteItem::File(_) => ItemKind::File,
        }
    }

    /// Human title; for files this is the display name.
    pub fn title(&self) -> &str {
        match self {
            RemoteItem::Assignment(a) => &a.name,
            RemoteItem::CalendarEvent(e) => &e.title,
            RemoteItem::Page(p) => &p.title,
            RemoteItem::ExternalLink(l) => &l.title,
            RemoteItem::File(f) => &f.display_name,
        }
    }

    /// Remote last-modified timestamp, as reported by the remote source.
    pub fn updated_at(&self) -> Option<&str> {
        match self {
            RemoteItem::Assignment(a) => a.updated_at.as_deref(),
            RemoteItem::CalendarEvent(e) => e.updated_at.as_deref(),
            RemoteItem::Page(p) => p.updated_at.as_deref(),
            RemoteItem::ExternalLink(l) => l.updated_at.as_deref(),
            RemoteItem::File(f) => f.updated_at.as_deref(),
        }
    }

    pub fn course_id(&self) -> Option<CourseId> {
        match self {
            RemoteItem::Assignment(a) => Some(a.course_id.clone()),
            RemoteItem::CalendarEvent(e) => e.course_id(),
            RemoteItem::Page(p) => Some(p.course_id.clone()),
            RemoteItem::ExternalLink(l) => Some(l.course_id.clone()),
            RemoteItem::File(f) => Some(f.course_id.clone()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
