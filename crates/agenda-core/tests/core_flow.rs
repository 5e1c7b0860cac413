use std::io::Write;

use agenda_core::config::CalendarConfig;
use agenda_core::index::{EventIndex, InvalidEventPolicy};
use agenda_core::navigation::{Granularity, NavigationController};
use agenda_core::render::Renderer;
use agenda_core::selection::SelectionState;
use agenda_core::source::load_snapshot;
use agenda_core::view::CalendarViewModel;
use chrono::NaiveDate;
use tempfile::NamedTempFile;

const SNAPSHOT: &str = r#"[
  {"id": "event-1", "title": "Demo - TechCorp Inc.", "contact": "Sarah Johnson",
   "type": "demo", "date": "2024-01-16", "time": "2:00 PM - 3:00 PM",
   "duration": "1 hour", "location": "Zoom Meeting",
   "attendees": ["Sarah Johnson", "Mike Wilson"], "status": "confirmed",
   "description": "Product demonstration"},
  {"id": "event-2", "title": "Discovery - Acme", "type": "discovery",
   "date": "2024-01-16", "time": "4:00 PM - 4:30 PM", "status": "pending"},
  {"id": "event-3", "title": "Follow-up Call", "contact": "Lisa Chen",
   "type": "call", "date": "2024-01-17", "time": "10:00 AM - 10:30 AM",
   "status": "confirmed"},
  {"id": "event-4", "title": "Quarterly Review", "type": "meeting",
   "date": "2024-01-18T09:00:00-05:00", "time": "9:00 AM - 10:00 AM",
   "status": "cancelled"},
  {"id": "broken", "title": "No date", "type": "demo", "date": "next week"}
]"#;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn snapshot_file() -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(".json").expect("temp file");
    file.write_all(SNAPSHOT.as_bytes()).expect("write snapshot");
    file
}

#[test]
fn snapshot_to_rendered_month() {
    let file = snapshot_file();
    let records = load_snapshot(file.path()).expect("load snapshot");
    assert_eq!(records.len(), 5);

    let index = EventIndex::build(records, InvalidEventPolicy::Skip).expect("skip policy");
    assert_eq!(index.len(), 4);
    assert_eq!(index.skipped().len(), 1);
    assert_eq!(index.skipped()[0].id, "broken");

    let today = date(2024, 1, 16);
    let nav = NavigationController::new(today);
    let mut selection = SelectionState::new();
    selection.select("event-1");

    let cfg = CalendarConfig::default();
    let view = CalendarViewModel::build(
        &nav.state(),
        &index,
        &selection,
        today,
        &cfg.view_options(),
    );

    let today_ids = view
        .today_events
        .iter()
        .map(|entry| entry.event.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(today_ids, vec!["event-1", "event-2"]);

    let upcoming_ids = view
        .upcoming_events
        .iter()
        .map(|entry| entry.event.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(upcoming_ids, vec!["event-3", "event-4"]);

    let detail = view.selected_event_detail.as_ref().expect("selected event");
    assert_eq!(detail.attendee_count, 2);

    let mut out = Vec::new();
    Renderer::plain()
        .write_calendar(&mut out, &view)
        .expect("render");
    let text = String::from_utf8(out).expect("utf8 output");

    assert!(text.starts_with("January 2024\n"));
    assert!(text.contains("[16]"));
    assert!(text.contains("2024-01-17 • 10:00 AM  Follow-up Call  Lisa Chen"));
    assert!(text.contains("2024-01-18 • 9:00 AM"));
    assert!(text.contains("SJ  Sarah Johnson"));
    assert!(text.contains("location    Zoom Meeting"));
}

#[test]
fn abort_policy_reports_the_invalid_event() {
    let file = snapshot_file();
    let records = load_snapshot(file.path()).expect("load snapshot");

    let err = EventIndex::build(records, InvalidEventPolicy::Abort).expect_err("abort policy");
    assert_eq!(err.id, "broken");
    assert_eq!(err.position, 4);
    assert_eq!(err.raw, "next week");
}

#[test]
fn navigating_away_keeps_today_panels() {
    let file = snapshot_file();
    let index = EventIndex::build(
        load_snapshot(file.path()).expect("load snapshot"),
        InvalidEventPolicy::Skip,
    )
    .expect("skip policy");

    let today = date(2024, 1, 16);
    let mut nav = NavigationController::new(today);
    nav.next_period();
    nav.set_granularity(Granularity::Month);

    let view = CalendarViewModel::build(
        &nav.state(),
        &index,
        &SelectionState::new(),
        today,
        &CalendarConfig::default().view_options(),
    );
    assert_eq!(view.title, "February 2024");
    assert_eq!(view.today_events.len(), 2);
    assert!(view.cell(date(2024, 1, 16)).is_none_or(|cell| !cell.in_current_month));

    nav.jump_to_today(today);
    assert_eq!(nav.state().focus, today);
}
