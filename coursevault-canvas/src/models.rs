//! Canvas REST payloads and their conversion into domain types.
//!
//! Canvas encodes ids as JSON numbers on most endpoints and as strings on a
//! few; every id becomes an opaque string here. Missing fields default.

use serde::{Deserialize, Deserializer, Serialize};

use coursevault_core::{
    Assignment, CalendarEvent, Course, CourseId, ItemId, RemoteFile, Submission,
};

/// Number-or-string id → `String`.
fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Num(i64),
        Str(String),
    }
    Ok(match RawId::deserialize(d)? {
        RawId::Num(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

// ---------------------------------------------------------------------------
// Listing types that are not vault items themselves
// ---------------------------------------------------------------------------

/// A course file folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// A course module (usually one per week).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// One entry of a module; only `Page` and `ExternalUrl` entries are mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", default)]
    pub item_type: String,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub external_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// A wiki page body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiPage {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct WireCourse {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    course_code: Option<String>,
}

impl From<WireCourse> for Course {
    fn from(w: WireCourse) -> Self {
        Course {
            id: CourseId(w.id),
            name: w.name,
            course_code: w.course_code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireSubmission {
    #[serde(default)]
    workflow_state: Option<String>,
    #[serde(default)]
    grade: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireAssignment {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    due_at: Option<String>,
    #[serde(default)]
    points_possible: Option<f64>,
    #[serde(default)]
    submission_types: Vec<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    submission: Option<WireSubmission>,
}

impl WireAssignment {
    pub(crate) fn into_domain(self, course_id: &CourseId) -> Assignment {
        Assignment {
            id: ItemId(self.id),
            course_id: course_id.clone(),
            name: self.name,
            description: self.description,
            due_at: self.due_at,
            points_possible: self.points_possible,
            submission_types: self.submission_types,
            html_url: self.html_url,
            updated_at: self.updated_at,
            submission: self.submission.map(|s| Submission {
                workflow_state: s.workflow_state,
                grade: s.grade,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireEvent {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    context_code: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start_at: Option<String>,
    #[serde(default)]
    end_at: Option<String>,
    #[serde(default)]
    location_name: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl From<WireEvent> for CalendarEvent {
    fn from(w: WireEvent) -> Self {
        CalendarEvent {
            id: ItemId(w.id),
            context_code: w.context_code,
            title: w.title,
            description: w.description,
            start_at: w.start_at,
            end_at: w.end_at,
            location_name: w.location_name,
            html_url: w.html_url,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFile {
    #[serde(deserialize_with = "id_string")]
    id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(rename = "content-type", default)]
    content_type: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

impl WireFile {
    pub(crate) fn into_domain(self, course_id: &CourseId, folder: &Folder) -> RemoteFile {
        RemoteFile {
            id: ItemId(self.id),
            course_id: course_id.clone(),
            folder_name: folder.name.clone(),
            display_name: self.display_name,
            url: self.url,
            size: self.size,
            content_type: self.content_type,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_ids_become_strings() {
        let num: Folder = serde_json::from_str(r#"{"id": 123, "name": "Week1"}"#).unwrap();
        let text: Folder = serde_json::from_str(r#"{"id": "abc", "name": "x"}"#).unwrap();
        assert_eq!(num.id, "123");
        assert_eq!(text.id, "abc");
    }

    #[test]
    fn assignment_wire_defaults_missing_fields() {
        let w: WireAssignment = serde_json::from_str(r#"{"id": 5, "name": "HW"}"#).unwrap();
        let a = w.into_domain(&CourseId::from("9"));
        assert_eq!(a.id, ItemId::from("5"));
        assert_eq!(a.course_id, CourseId::from("9"));
        assert!(a.submission_types.is_empty());
        assert!(a.submission.is_none());
    }

    #[test]
    fn module_item_type_field() {
        let item: ModuleItem = serde_json::from_str(
            r#"{"id": 1, "title": "Reading", "type": "Page", "page_url": "week-1-reading"}"#,
        )
        .unwrap();
        assert_eq!(item.item_type, "Page");
        assert_eq!(item.page_url.as_deref(), Some("week-1-reading"));
    }
}
