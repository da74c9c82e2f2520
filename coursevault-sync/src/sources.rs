//! Remote listings turned into [`RemoteItem`]s, one function per sync unit.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};

use coursevault_canvas::{is_http_url, LmsClient};
use coursevault_core::{CourseId, ExternalLink, ItemId, ItemKind, Page, RemoteItem};

use crate::error::SyncError;
use crate::paths::is_skipped_folder;

/// Calendar events are fetched from 30 days back to a year ahead.
pub const EVENT_LOOKBACK_DAYS: i64 = 30;
pub const EVENT_LOOKAHEAD_DAYS: i64 = 365;

const PAGE_ITEM: &str = "Page";
const EXTERNAL_URL_ITEM: &str = "ExternalUrl";

pub fn event_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (
        today - Duration::days(EVENT_LOOKBACK_DAYS),
        today + Duration::days(EVENT_LOOKAHEAD_DAYS),
    )
}

pub fn fetch_assignments(
    client: &dyn LmsClient,
    course_id: &CourseId,
) -> Result<Vec<RemoteItem>, SyncError> {
    Ok(client
        .list_assignments(course_id)?
        .into_iter()
        .map(RemoteItem::Assignment)
        .collect())
}

/// Pages and external links reached through a course's modules.
#[derive(Debug, Default)]
pub struct ModuleContent {
    pub pages: Vec<RemoteItem>,
    pub links: Vec<RemoteItem>,
}

/// Walk every module of a course.
///
/// A page listed by several modules is kept once, under the first module.
/// Pages that fail to load and links that are not http(s) are skipped.
pub fn fetch_module_content(
    client: &dyn LmsClient,
    course_id: &CourseId,
) -> Result<ModuleContent, SyncError> {
    let mut content = ModuleContent::default();
    let mut seen_pages = HashSet::new();
    let mut seen_links = HashSet::new();

    for module in client.list_modules(course_id)? {
        for entry in client.list_module_items(course_id, &module)? {
            match entry.item_type.as_str() {
                PAGE_ITEM => {
                    let Some(slug) = entry.page_url.as_deref().filter(|s| !s.is_empty()) else {
                        continue;
                    };
                    if !seen_pages.insert(slug.to_string()) {
                        continue;
                    }
                    let wiki = match client.get_page(course_id, slug) {
                        Ok(wiki) => wiki,
                        Err(err) => {
                            tracing::warn!("skipping page {slug} in course {course_id}: {err}");
                            continue;
                        }
                    };
                    let title = if wiki.title.trim().is_empty() {
                        entry.title.clone()
                    } else {
                        wiki.title
                    };
                    content.pages.push(RemoteItem::Page(Page {
                        id: ItemId::from(slug),
                        course_id: course_id.clone(),
                        module_name: module.name.clone(),
                        title,
                        body: wiki.body,
                        html_url: wiki.html_url.or(entry.html_url),
                        updated_at: wiki.updated_at,
                    }));
                }
                EXTERNAL_URL_ITEM => {
                    let Some(url) = entry.external_url.as_deref() else {
                        continue;
                    };
                    if !is_http_url(url) {
                        tracing::warn!("skipping non-http link {url} in course {course_id}");
                        continue;
                    }
                    if !seen_links.insert(entry.id.clone()) {
                        continue;
                    }
                    content.links.push(RemoteItem::ExternalLink(ExternalLink {
                        id: ItemId::from(entry.id),
                        course_id: course_id.clone(),
                        module_name: module.name.clone(),
                        title: entry.title,
                        url: url.to_string(),
                        updated_at: None,
                    }));
                }
                _ => {}
            }
        }
    }
    Ok(content)
}

/// Files from every non-system folder. A folder that fails to list is
/// logged and skipped.
pub fn fetch_files(
    client: &dyn LmsClient,
    course_id: &CourseId,
) -> Result<Vec<RemoteItem>, SyncError> {
    let mut files = Vec::new();
    for folder in client.list_folders(course_id)? {
        if is_skipped_folder(&folder.name) {
            continue;
        }
        match client.list_folder_files(course_id, &folder) {
            Ok(listed) => files.extend(listed.into_iter().map(RemoteItem::File)),
            Err(err) => {
                tracing::warn!("skipping folder {} in course {course_id}: {err}", folder.name);
            }
        }
    }
    Ok(files)
}

/// Events for `course_ids` inside [`event_window`], in one logical query.
pub fn fetch_events(
    client: &dyn LmsClient,
    course_ids: &[CourseId],
    today: NaiveDate,
) -> Result<Vec<RemoteItem>, SyncError> {
    if course_ids.is_empty() {
        return Ok(Vec::new());
    }
    let codes: Vec<String> = course_ids.iter().map(|id| format!("course_{id}")).collect();
    let (start, end) = event_window(today);
    Ok(client
        .list_calendar_events(&codes, start, end)?
        .into_iter()
        .map(RemoteItem::CalendarEvent)
        .collect())
}

/// Every remote item of `kind` in one course.
pub fn fetch_kind(
    client: &dyn LmsClient,
    course_id: &CourseId,
    kind: ItemKind,
    today: NaiveDate,
) -> Result<Vec<RemoteItem>, SyncError> {
    match kind {
        ItemKind::Assignment => fetch_assignments(client, course_id),
        ItemKind::CalendarEvent => fetch_events(client, std::slice::from_ref(course_id), today),
        ItemKind::Page => Ok(fetch_module_content(client, course_id)?.pages),
        ItemKind::ExternalLink => Ok(fetch_module_content(client, course_id)?.links),
        ItemKind::File => fetch_files(client, course_id),
    }
}
