//! In-memory LMS and scraper fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use coursevault_canvas::{
    CanvasError, Folder, LmsClient, Module, ModuleItem, ScrapedTask, TaskScraper, WikiPage,
};
use coursevault_core::{
    Assignment, CalendarEvent, Course, CourseId, ItemId, RemoteFile, ScrapeSource,
    SelectedCourse, Settings, Submission,
};

pub const COURSE_ID: &str = "42";
pub const COURSE_NAME: &str = "CS 225";

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, day, hour, 0, 0).unwrap()
}

fn not_found(what: &str) -> CanvasError {
    CanvasError::Http {
        status: 404,
        url: format!("fake://{what}"),
    }
}

#[derive(Default)]
pub struct FakeLms {
    pub courses: Vec<Course>,
    pub assignments: HashMap<CourseId, Vec<Assignment>>,
    pub events: Vec<CalendarEvent>,
    pub modules: HashMap<CourseId, Vec<(Module, Vec<ModuleItem>)>>,
    pub pages: HashMap<String, WikiPage>,
    pub folders: HashMap<CourseId, Vec<(Folder, Vec<RemoteFile>)>>,
    pub downloads: HashMap<String, Vec<u8>>,
    pub failing_assignments: HashSet<CourseId>,
    pub failing_events: bool,
}

impl FakeLms {
    pub fn with_course() -> Self {
        FakeLms {
            courses: vec![Course {
                id: CourseId::from(COURSE_ID),
                name: Some(COURSE_NAME.to_string()),
                course_code: None,
            }],
            ..FakeLms::default()
        }
    }

    pub fn assignments_mut(&mut self) -> &mut Vec<Assignment> {
        self.assignments.entry(CourseId::from(COURSE_ID)).or_default()
    }
}

impl LmsClient for FakeLms {
    fn list_active_courses(&self) -> Result<Vec<Course>, CanvasError> {
        Ok(self.courses.clone())
    }

    fn get_course(&self, course_id: &CourseId) -> Result<Course, CanvasError> {
        self.courses
            .iter()
            .find(|c| &c.id == course_id)
            .cloned()
            .ok_or_else(|| not_found("course"))
    }

    fn list_assignments(&self, course_id: &CourseId) -> Result<Vec<Assignment>, CanvasError> {
        if self.failing_assignments.contains(course_id) {
            return Err(CanvasError::RateLimitExhausted { attempts: 3 });
        }
        Ok(self.assignments.get(course_id).cloned().unwrap_or_default())
    }

    fn list_calendar_events(
        &self,
        context_codes: &[String],
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, CanvasError> {
        if self.failing_events {
            return Err(not_found("calendar_events"));
        }
        Ok(self
            .events
            .iter()
            .filter(|e| context_codes.contains(&e.context_code))
            .cloned()
            .collect())
    }

    fn list_folders(&self, course_id: &CourseId) -> Result<Vec<Folder>, CanvasError> {
        Ok(self
            .folders
            .get(course_id)
            .map(|fs| fs.iter().map(|(f, _)| f.clone()).collect())
            .unwrap_or_default())
    }

    fn list_folder_files(
        &self,
        course_id: &CourseId,
        folder: &Folder,
    ) -> Result<Vec<RemoteFile>, CanvasError> {
        self.folders
            .get(course_id)
            .and_then(|fs| fs.iter().find(|(f, _)| f.id == folder.id))
            .map(|(_, files)| files.clone())
            .ok_or_else(|| not_found("folder"))
    }

    fn list_modules(&self, course_id: &CourseId) -> Result<Vec<Module>, CanvasError> {
        Ok(self
            .modules
            .get(course_id)
            .map(|ms| ms.iter().map(|(m, _)| m.clone()).collect())
            .unwrap_or_default())
    }

    fn list_module_items(
        &self,
        course_id: &CourseId,
        module: &Module,
    ) -> Result<Vec<ModuleItem>, CanvasError> {
        self.modules
            .get(course_id)
            .and_then(|ms| ms.iter().find(|(m, _)| m.id == module.id))
            .map(|(_, items)| items.clone())
            .ok_or_else(|| not_found("module"))
    }

    fn get_page(&self, _course_id: &CourseId, page_url: &str) -> Result<WikiPage, CanvasError> {
        self.pages.get(page_url).cloned().ok_or_else(|| not_found(page_url))
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, CanvasError> {
        self.downloads.get(url).cloned().ok_or_else(|| not_found(url))
    }
}

/// Returns canned tasks per source label; unknown labels fail.
#[derive(Default)]
pub struct FakeScraper {
    pub tasks: HashMap<String, Vec<ScrapedTask>>,
}

impl TaskScraper for FakeScraper {
    fn scrape(&self, source: &ScrapeSource) -> Result<Vec<ScrapedTask>, CanvasError> {
        self.tasks
            .get(&source.label)
            .cloned()
            .ok_or_else(|| CanvasError::InvalidUrl(source.url.clone()))
    }
}

pub fn settings() -> Settings {
    Settings {
        selected_courses: vec![SelectedCourse {
            course_id: CourseId::from(COURSE_ID),
            course_name: COURSE_NAME.to_string(),
            selected_at: at(1, 0),
        }],
        sync_files: true,
        generate_todo: true,
        ..Settings::default()
    }
}

pub fn homework_1() -> Assignment {
    Assignment {
        id: ItemId::from("1001"),
        course_id: CourseId::from(COURSE_ID),
        name: "Homework 1".to_string(),
        description: Some("<p>Read chapter 1.</p>".to_string()),
        due_at: Some("2026-02-15T23:59:00Z".to_string()),
        points_possible: Some(100.0),
        submission_types: vec!["online_upload".to_string()],
        html_url: Some("https://canvas.example.edu/courses/42/assignments/1001".to_string()),
        updated_at: Some("2026-02-01T08:00:00Z".to_string()),
        submission: None,
    }
}

pub fn graded(mut assignment: Assignment) -> Assignment {
    assignment.submission = Some(Submission {
        workflow_state: Some("graded".to_string()),
        grade: Some("A".to_string()),
    });
    assignment
}

pub fn event(id: &str, title: &str, start: Option<&str>, end: Option<&str>) -> CalendarEvent {
    CalendarEvent {
        id: ItemId::from(id),
        context_code: format!("course_{COURSE_ID}"),
        title: title.to_string(),
        description: None,
        start_at: start.map(str::to_string),
        end_at: end.map(str::to_string),
        location_name: Some("Siebel 1404".to_string()),
        html_url: None,
        updated_at: Some("2026-02-01T08:00:00Z".to_string()),
    }
}
