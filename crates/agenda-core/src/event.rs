use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::date::parse_clock_time;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Demo,
    Call,
    Discovery,
    Meeting,
    Other,
    /// A category this build does not know about yet. Kept verbatim so it
    /// can still be displayed.
    Unrecognized(String),
}

impl EventKind {
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "demo" => Self::Demo,
            "call" => Self::Call,
            "discovery" => Self::Discovery,
            "meeting" => Self::Meeting,
            "other" | "" => Self::Other,
            _ => Self::Unrecognized(key.trim().to_string()),
        }
    }

    pub fn as_key(&self) -> &str {
        match self {
            Self::Demo => "demo",
            Self::Call => "call",
            Self::Discovery => "discovery",
            Self::Meeting => "meeting",
            Self::Other => "other",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Confirmed,
    Pending,
    Cancelled,
    Unrecognized(String),
}

impl EventStatus {
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "confirmed" => Self::Confirmed,
            "pending" => Self::Pending,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Unrecognized(key.trim().to_string()),
        }
    }

    pub fn as_key(&self) -> &str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
            Self::Unrecognized(raw) => raw.as_str(),
        }
    }
}

/// Time-of-day label for an event. Never used for grid placement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeRange {
    pub label: String,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl TimeRange {
    pub fn parse(label: &str) -> Self {
        let label = label.trim();
        let (start_raw, end_raw) = split_range(label);

        Self {
            label: label.to_string(),
            start: parse_clock_time(start_raw),
            end: end_raw.and_then(parse_clock_time),
        }
    }

    /// The part of the label before the range separator, e.g. `2:00 PM`
    /// for `2:00 PM - 3:00 PM`.
    pub fn start_label(&self) -> &str {
        split_range(&self.label).0
    }
}

/// Splits on `" - "`, or on a bare `-` only when both sides are clock
/// times, so labels such as `All-day` stay whole.
fn split_range(label: &str) -> (&str, Option<&str>) {
    if let Some((start, end)) = label.split_once(" - ") {
        return (start.trim(), Some(end.trim()));
    }

    match label.split_once('-') {
        Some((start, end))
            if parse_clock_time(start).is_some() && parse_clock_time(end).is_some() =>
        {
            (start.trim(), Some(end.trim()))
        }
        _ => (label.trim(), None),
    }
}

/// An event as the snapshot stores it. Dates and categories stay raw text
/// until the index validates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub contact: Option<String>,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub date: String,

    #[serde(default, alias = "timeRange")]
    pub time: String,

    #[serde(default)]
    pub duration: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub attendees: Vec<String>,

    #[serde(default)]
    pub status: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub contact: Option<String>,
    pub kind: EventKind,
    pub date: NaiveDate,
    pub time: TimeRange,
    pub duration: String,
    pub location: String,
    pub description: String,
    pub attendees: Vec<String>,
    pub status: EventStatus,
}

impl CalendarEvent {
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            contact: None,
            kind: EventKind::Other,
            date,
            time: TimeRange::default(),
            duration: String::new(),
            location: String::new(),
            description: String::new(),
            attendees: vec![],
            status: EventStatus::Pending,
        }
    }

    /// Builds the typed event once `date` has been normalized from
    /// `record.date`.
    pub fn from_record(record: EventRecord, date: NaiveDate) -> Self {
        let contact = record
            .contact
            .filter(|contact| !contact.trim().is_empty());

        Self {
            id: record.id,
            title: record.title,
            contact,
            kind: EventKind::from_key(&record.kind),
            date,
            time: TimeRange::parse(&record.time),
            duration: record.duration,
            location: record.location,
            description: record.description,
            attendees: record.attendees,
            status: EventStatus::from_key(&record.status),
        }
    }

    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }

    /// Name shown next to the event in lists: the contact when present,
    /// otherwise the first attendee.
    pub fn display_contact(&self) -> Option<&str> {
        self.contact
            .as_deref()
            .or_else(|| self.attendees.first().map(String::as_str))
    }
}

/// First letter of each whitespace-separated part of `name`.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::*;

    #[test]
    fn unknown_categories_are_kept_verbatim() {
        assert_eq!(EventKind::from_key("Demo"), EventKind::Demo);
        assert_eq!(EventKind::from_key(""), EventKind::Other);
        assert_eq!(
            EventKind::from_key("webinar"),
            EventKind::Unrecognized("webinar".to_string())
        );
        assert_eq!(EventKind::from_key("webinar").as_key(), "webinar");
        assert_eq!(EventStatus::from_key("canceled"), EventStatus::Cancelled);
        assert_eq!(
            EventStatus::from_key("tentative"),
            EventStatus::Unrecognized("tentative".to_string())
        );
    }

    #[test]
    fn time_range_parses_twelve_hour_labels() {
        let range = TimeRange::parse("2:00 PM - 3:00 PM");
        assert_eq!(range.start, NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(range.end, NaiveTime::from_hms_opt(15, 0, 0));
        assert_eq!(range.start_label(), "2:00 PM");

        let compact = TimeRange::parse("09:30-10:15");
        assert_eq!(compact.start, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(compact.end, NaiveTime::from_hms_opt(10, 15, 0));

        let free_text = TimeRange::parse("All day");
        assert_eq!(free_text.start, None);
        assert_eq!(free_text.start_label(), "All day");

        for label in ["All-day", "Mid-morning"] {
            let hyphenated = TimeRange::parse(label);
            assert_eq!(hyphenated.start, None);
            assert_eq!(hyphenated.end, None);
            assert_eq!(hyphenated.start_label(), label);
        }
    }

    #[test]
    fn record_deserializes_with_unknown_fields() {
        let raw = r#"{
            "id": "event-1",
            "title": "Demo - TechCorp Inc.",
            "contact": "Sarah Johnson",
            "type": "demo",
            "date": "2024-01-16",
            "time": "2:00 PM - 3:00 PM",
            "attendees": ["Sarah Johnson", "Mike Wilson"],
            "status": "confirmed",
            "avatar": "/api/placeholder/32/32"
        }"#;
        let record: EventRecord = serde_json::from_str(raw).expect("parse record");
        assert!(record.extra.contains_key("avatar"));

        let date = NaiveDate::from_ymd_opt(2024, 1, 16).expect("valid date");
        let event = CalendarEvent::from_record(record, date);
        assert_eq!(event.kind, EventKind::Demo);
        assert_eq!(event.status, EventStatus::Confirmed);
        assert_eq!(event.attendee_count(), 2);
        assert_eq!(event.display_contact(), Some("Sarah Johnson"));
    }

    #[test]
    fn initials_take_first_letters() {
        assert_eq!(initials("Sarah Johnson"), "SJ");
        assert_eq!(initials("  emily  de rodriguez "), "EDR");
        assert_eq!(initials(""), "");
    }
}
