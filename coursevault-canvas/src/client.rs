//! [`LmsClient`] trait and the ureq-backed [`CanvasClient`].
//!
//! Every request is wrapped in [`with_backoff`]; list endpoints follow the
//! `Link: rel="next"` chain until exhausted.

use std::io::Read;
use std::time::Duration;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use url::Url;

use coursevault_core::{Assignment, CalendarEvent, Course, CourseId, RemoteFile};

use crate::backoff::with_backoff;
use crate::error::CanvasError;
use crate::models::{
    Folder, Module, ModuleItem, WikiPage, WireAssignment, WireCourse, WireEvent, WireFile,
};
use crate::urls::{is_allowed_url, next_link};

const PER_PAGE: &str = "100";
/// Canvas rejects calendar queries naming more contexts than this.
const MAX_CONTEXT_CODES: usize = 10;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Read access to the remote LMS.
pub trait LmsClient {
    fn list_active_courses(&self) -> Result<Vec<Course>, CanvasError>;

    fn get_course(&self, course_id: &CourseId) -> Result<Course, CanvasError>;

    /// Assignments with the current user's submission, ordered by due date.
    fn list_assignments(&self, course_id: &CourseId) -> Result<Vec<Assignment>, CanvasError>;

    /// Events for `context_codes` (`course_<id>`) between `start` and `end`.
    fn list_calendar_events(
        &self,
        context_codes: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, CanvasError>;

    fn list_folders(&self, course_id: &CourseId) -> Result<Vec<Folder>, CanvasError>;

    fn list_folder_files(
        &self,
        course_id: &CourseId,
        folder: &Folder,
    ) -> Result<Vec<RemoteFile>, CanvasError>;

    fn list_modules(&self, course_id: &CourseId) -> Result<Vec<Module>, CanvasError>;

    fn list_module_items(
        &self,
        course_id: &CourseId,
        module: &Module,
    ) -> Result<Vec<ModuleItem>, CanvasError>;

    fn get_page(&self, course_id: &CourseId, page_url: &str) -> Result<WikiPage, CanvasError>;

    /// Raw bytes of a file. Only URLs on the LMS host are fetched.
    fn download(&self, url: &str) -> Result<Vec<u8>, CanvasError>;
}

// ---------------------------------------------------------------------------
// CanvasClient
// ---------------------------------------------------------------------------

/// Canvas REST API client authenticated with a bearer token.
pub struct CanvasClient {
    agent: ureq::Agent,
    base: Url,
    host: String,
    token: String,
}

impl CanvasClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, CanvasError> {
        let mut base =
            Url::parse(base_url).map_err(|_| CanvasError::InvalidUrl(base_url.to_string()))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let host = base
            .host_str()
            .ok_or_else(|| CanvasError::InvalidUrl(base_url.to_string()))?
            .to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("coursevault/", env!("CARGO_PKG_VERSION")))
            .build();
        Ok(CanvasClient {
            agent,
            base,
            host,
            token: token.to_string(),
        })
    }

    /// Host every API and download request is restricted to.
    pub fn host(&self) -> &str {
        &self.host
    }

    fn api_url(&self, segments: &[&str]) -> Result<Url, CanvasError> {
        let mut url = self
            .base
            .join("api/v1/")
            .map_err(|_| CanvasError::InvalidUrl(self.base.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CanvasError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn send(&self, url: &str) -> Result<ureq::Response, CanvasError> {
        if !is_allowed_url(url, &self.host) {
            return Err(CanvasError::UntrustedHost { url: url.to_string() });
        }
        tracing::debug!("GET {url}");
        self.agent
            .get(url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(|e| map_ureq_error(url, e))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, CanvasError> {
        let url = url.as_str();
        let resp = with_backoff(|| self.send(url))?;
        resp.into_json().map_err(|source| CanvasError::Decode {
            url: url.to_string(),
            source,
        })
    }

    fn get_paginated<T: DeserializeOwned>(&self, mut url: Url) -> Result<Vec<T>, CanvasError> {
        url.query_pairs_mut().append_pair("per_page", PER_PAGE);
        let mut out = Vec::new();
        let mut next = Some(url.to_string());
        while let Some(page_url) = next.take() {
            let resp = with_backoff(|| self.send(&page_url))?;
            next = resp.header("Link").and_then(next_link);
            let mut page: Vec<T> = resp.into_json().map_err(|source| CanvasError::Decode {
                url: page_url.clone(),
                source,
            })?;
            out.append(&mut page);
        }
        Ok(out)
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> CanvasError {
    match err {
        ureq::Error::Status(429, _) => CanvasError::RateLimited,
        ureq::Error::Status(403, resp) => {
            let body = resp.into_string().unwrap_or_default();
            if body.contains("Rate Limit Exceeded") {
                CanvasError::RateLimited
            } else {
                CanvasError::Http { status: 403, url: url.to_string() }
            }
        }
        ureq::Error::Status(status, _) => CanvasError::Http { status, url: url.to_string() },
        ureq::Error::Transport(t) => CanvasError::Transport {
            url: url.to_string(),
            message: t.to_string(),
        },
    }
}

impl LmsClient for CanvasClient {
    fn list_active_courses(&self) -> Result<Vec<Course>, CanvasError> {
        let mut url = self.api_url(&["courses"])?;
        url.query_pairs_mut().append_pair("enrollment_state", "active");
        let wire: Vec<WireCourse> = self.get_paginated(url)?;
        Ok(wire.into_iter().map(Course::from).collect())
    }

    fn get_course(&self, course_id: &CourseId) -> Result<Course, CanvasError> {
        let url = self.api_url(&["courses", &course_id.0])?;
        let wire: WireCourse = self.get_json(&url)?;
        Ok(wire.into())
    }

    fn list_assignments(&self, course_id: &CourseId) -> Result<Vec<Assignment>, CanvasError> {
        let mut url = self.api_url(&["courses", &course_id.0, "assignments"])?;
        url.query_pairs_mut()
            .append_pair("include[]", "submission")
            .append_pair("order_by", "due_at");
        let wire: Vec<WireAssignment> = self.get_paginated(url)?;
        Ok(wire.into_iter().map(|w| w.into_domain(course_id)).collect())
    }

    fn list_calendar_events(
        &self,
        context_codes: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, CanvasError> {
        let mut events = Vec::new();
        for chunk in context_codes.chunks(MAX_CONTEXT_CODES) {
            let mut url = self.api_url(&["calendar_events"])?;
            {
                let mut q = url.query_pairs_mut();
                q.append_pair("type", "event")
                    .append_pair("start_date", &start.format("%Y-%m-%d").to_string())
                    .append_pair("end_date", &end.format("%Y-%m-%d").to_string());
                for code in chunk {
                    q.append_pair("context_codes[]", code);
                }
            }
            let wire: Vec<WireEvent> = self.get_paginated(url)?;
            events.extend(wire.into_iter().map(CalendarEvent::from));
        }
        Ok(events)
    }

    fn list_folders(&self, course_id: &CourseId) -> Result<Vec<Folder>, CanvasError> {
        let url = self.api_url(&["courses", &course_id.0, "folders"])?;
        self.get_paginated(url)
    }

    fn list_folder_files(
        &self,
        course_id: &CourseId,
        folder: &Folder,
    ) -> Result<Vec<RemoteFile>, CanvasError> {
        let url = self.api_url(&["folders", &folder.id, "files"])?;
        let wire: Vec<WireFile> = self.get_paginated(url)?;
        Ok(wire
            .into_iter()
            .map(|w| w.into_domain(course_id, folder))
            .collect())
    }

    fn list_modules(&self, course_id: &CourseId) -> Result<Vec<Module>, CanvasError> {
        let url = self.api_url(&["courses", &course_id.0, "modules"])?;
        self.get_paginated(url)
    }

    fn list_module_items(
        &self,
        course_id: &CourseId,
        module: &Module,
    ) -> Result<Vec<ModuleItem>, CanvasError> {
        let url = self.api_url(&["courses", &course_id.0, "modules", &module.id, "items"])?;
        self.get_paginated(url)
    }

    fn get_page(&self, course_id: &CourseId, page_url: &str) -> Result<WikiPage, CanvasError> {
        let url = self.api_url(&["courses", &course_id.0, "pages", page_url])?;
        self.get_json(&url)
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, CanvasError> {
        let resp = with_backoff(|| self.send(url))?;
        let mut bytes = Vec::new();
        resp.into_reader()
            .read_to_end(&mut bytes)
            .map_err(|source| CanvasError::Decode {
                url: url.to_string(),
                source,
            })?;
        Ok(bytes)
    }
}
