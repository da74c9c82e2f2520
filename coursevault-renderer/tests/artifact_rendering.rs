use chrono::{DateTime, TimeZone, Utc};
use coursevault_core::{
    Assignment, CalendarEvent, Course, CourseId, ExternalLink, ItemId, Page, RemoteItem,
    Submission,
};
use coursevault_renderer::Renderer;
use rstest::rstest;
use tempfile::TempDir;

fn course() -> Course {
    Course {
        id: CourseId::from("42"),
        name: Some("Linear Algebra".to_string()),
        course_code: Some("MATH 415".to_string()),
    }
}

fn rendered_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
}

fn assignment() -> Assignment {
    Assignment {
        id: ItemId::from("1001"),
        course_id: CourseId::from("42"),
        name: "Problem Set 3".to_string(),
        description: Some("<p>Solve <strong>all</strong> problems.</p>".to_string()),
        due_at: Some("2026-02-15T23:59:00Z".to_string()),
        points_possible: Some(100.0),
        submission_types: vec!["online_upload".to_string(), "online_text_entry".to_string()],
        html_url: Some("https://canvas.example.edu/courses/42/assignments/1001".to_string()),
        updated_at: Some("2026-01-20T10:00:00Z".to_string()),
        submission: Some(Submission {
            workflow_state: Some("submitted".to_string()),
            grade: None,
        }),
    }
}

fn event(start: Option<&str>, end: Option<&str>) -> CalendarEvent {
    CalendarEvent {
        id: ItemId::from("e-7"),
        context_code: "course_42".to_string(),
        title: "Midterm Exam".to_string(),
        description: None,
        start_at: start.map(str::to_string),
        end_at: end.map(str::to_string),
        location_name: Some("Room 1002".to_string()),
        html_url: None,
        updated_at: None,
    }
}

fn split_artifact(text: &str) -> (&str, &str) {
    let rest = text.strip_prefix("---\n").expect("artifact starts with header fence");
    let end = rest.find("\n---\n\n").expect("header closing fence");
    (&rest[..end + 1], &rest[end + "\n---\n\n".len()..])
}

#[test]
fn assignment_artifact_has_header_and_body() {
    let renderer = Renderer::new().unwrap();
    let out = renderer
        .render_item(&RemoteItem::Assignment(assignment()), &course(), rendered_at())
        .unwrap();

    let (header, body) = split_artifact(&out);
    let parsed: serde_yaml::Mapping = serde_yaml::from_str(header).expect("header is YAML");
    let field = |k: &str| parsed.get(k).cloned().unwrap_or(serde_yaml::Value::Null);
    assert_eq!(field("type"), serde_yaml::Value::from("assignment"));
    assert_eq!(field("course"), serde_yaml::Value::from("Linear Algebra"));
    assert_eq!(field("course_id"), serde_yaml::Value::from("42"));
    assert_eq!(field("canvas_id"), serde_yaml::Value::from("1001"));
    assert_eq!(field("status"), serde_yaml::Value::from("submitted"));
    assert_eq!(field("due"), serde_yaml::Value::from("2026-02-15T23:59:00Z"));
    assert_eq!(field("points"), serde_yaml::Value::from(100.0));

    assert_eq!(
        body,
        "# Problem Set 3\n\n## Description\n\nSolve **all** problems.\n\n## Details\n\n\
         - **Due**: February 15, 2026 at 11:59 PM\n\
         - **Points**: 100\n\
         - **Submission Types**: online_upload, online_text_entry\n\n\
         [Open in Canvas](https://canvas.example.edu/courses/42/assignments/1001)\n"
    );
}

#[test]
fn header_keys_are_emitted_sorted() {
    let renderer = Renderer::new().unwrap();
    let out = renderer
        .render_item(&RemoteItem::Assignment(assignment()), &course(), rendered_at())
        .unwrap();
    let (header, _) = split_artifact(&out);
    let keys: Vec<&str> = header.lines().filter_map(|l| l.split(':').next()).collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
}

#[test]
fn rendering_is_deterministic_for_fixed_time() {
    let renderer = Renderer::new().unwrap();
    let item = RemoteItem::Assignment(assignment());
    let a = renderer.render_item(&item, &course(), rendered_at()).unwrap();
    let b = renderer.render_item(&item, &course(), rendered_at()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn placeholders_when_fields_are_absent() {
    let mut bare = assignment();
    bare.description = None;
    bare.due_at = None;
    bare.points_possible = None;
    bare.submission_types.clear();
    bare.html_url = None;

    let out = Renderer::new()
        .unwrap()
        .render_item(&RemoteItem::Assignment(bare), &course(), rendered_at())
        .unwrap();
    assert!(out.contains("No description provided."));
    assert!(out.contains("- **Due**: No due date"));
    assert!(out.contains("- **Points**: Ungraded"));
    assert!(out.contains("- **Submission Types**: None"));
    assert!(!out.contains("Open in Canvas"));
}

#[rstest]
#[case(Some("2026-03-01T00:00:00-06:00"), None, "March 01, 2026 (All Day)", true)]
#[case(
    Some("2026-03-02T10:00:00Z"),
    Some("2026-03-02T11:30:00Z"),
    "March 02, 2026 from 10:00 AM to 11:30 AM",
    false
)]
#[case(None, None, "Time not specified", false)]
fn event_time_display(
    #[case] start: Option<&str>,
    #[case] end: Option<&str>,
    #[case] when: &str,
    #[case] all_day: bool,
) {
    let out = Renderer::new()
        .unwrap()
        .render_item(&RemoteItem::CalendarEvent(event(start, end)), &course(), rendered_at())
        .unwrap();
    assert!(out.contains(&format!("## When\n\n{when}\n")), "{out}");
    assert!(out.contains(&format!("all_day: {all_day}")), "{out}");
    assert!(out.contains("## Location\n\nRoom 1002"));
}

#[test]
fn page_and_link_render() {
    let renderer = Renderer::new().unwrap();
    let page = RemoteItem::Page(Page {
        id: ItemId::from("syllabus"),
        course_id: CourseId::from("42"),
        module_name: "Week 1".to_string(),
        title: "Syllabus".to_string(),
        body: Some("<h2>Grading</h2><ul><li>Exams 60%</li><li>Homework 40%</li></ul>".to_string()),
        html_url: None,
        updated_at: None,
    });
    let out = renderer.render_item(&page, &course(), rendered_at()).unwrap();
    assert!(out.contains("**Module**: Week 1"));
    assert!(out.contains("## Grading\n\n- Exams 60%\n- Homework 40%"), "{out}");

    let link = RemoteItem::ExternalLink(ExternalLink {
        id: ItemId::from("77"),
        course_id: CourseId::from("42"),
        module_name: "Week 1".to_string(),
        title: "Textbook".to_string(),
        url: "https://textbook.example.org/ch1".to_string(),
        updated_at: None,
    });
    let out = renderer.render_item(&link, &course(), rendered_at()).unwrap();
    assert!(out.contains("[Textbook](https://textbook.example.org/ch1)"));
    assert!(out.contains("type: external_link"));
}

#[test]
fn user_template_overrides_embedded_default() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("assignment.md.tera"),
        "CUSTOM {{ title }}\r\nDue {{ due }}\r\n",
    )
    .unwrap();

    let renderer = Renderer::with_template_dir(dir.path()).unwrap();
    let out = renderer
        .render_item(&RemoteItem::Assignment(assignment()), &course(), rendered_at())
        .unwrap();
    assert!(out.contains("CUSTOM Problem Set 3\nDue February 15, 2026 at 11:59 PM"));
    assert!(!out.contains('\r'), "line endings not normalised");
    assert!(out.contains("type: assignment"), "header is not templated");
}

#[test]
fn missing_override_dir_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let renderer = Renderer::with_template_dir(&dir.path().join("nope")).unwrap();
    let out = renderer
        .render_item(&RemoteItem::Assignment(assignment()), &course(), rendered_at())
        .unwrap();
    assert!(out.contains("## Details"));
}
