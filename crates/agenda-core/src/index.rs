use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{
  debug,
  info,
  warn
};

use crate::date::parse_calendar_date;
use crate::event::{
  CalendarEvent,
  EventRecord
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum InvalidDateReason {
  Missing,
  Unparseable
}

impl fmt::Display for InvalidDateReason {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | Self::Missing => {
        f.write_str("date is empty")
      }
      | Self::Unparseable => {
        f.write_str(
          "date is not a calendar date"
        )
      }
    }
  }
}

/// An event whose date cannot be
/// normalized into a calendar date.
#[derive(
  Debug, Clone, PartialEq, Eq, Error,
)]
#[error(
  "invalid event {id:?} at position \
   {position}: {reason} ({raw:?})"
)]
pub struct InvalidEventError {
  pub id:       String,
  pub position: usize,
  pub raw:      String,
  pub reason:   InvalidDateReason
}

/// What index construction does with
/// an event that has an invalid date.
#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum InvalidEventPolicy {
  /// Log the event and leave it out.
  #[default]
  Skip,
  /// Fail with the first invalid event.
  Abort
}

impl FromStr for InvalidEventPolicy {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "skip" => Ok(Self::Skip),
      | "abort" => Ok(Self::Abort),
      | other => {
        Err(anyhow!(
          "invalid event policy must \
           be skip or abort, got: \
           {other}"
        ))
      }
    }
  }
}

/// Events of one snapshot grouped by
/// date. Built once per snapshot; every
/// lookup afterwards is a hash probe or
/// a binary search.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
  events:  Vec<CalendarEvent>,
  by_date: HashMap<NaiveDate, Vec<usize>>,
  dates:   Vec<NaiveDate>,
  by_id:   HashMap<String, usize>,
  skipped: Vec<InvalidEventError>
}

impl EventIndex {
  #[must_use]
  pub fn empty() -> Self {
    Self::default()
  }

  #[tracing::instrument(skip(records), fields(records = records.len()))]
  pub fn build(
    records: Vec<EventRecord>,
    policy: InvalidEventPolicy
  ) -> Result<Self, InvalidEventError>
  {
    let mut events =
      Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for (position, record) in
      records.into_iter().enumerate()
    {
      match normalize_date(
        &record, position
      ) {
        | Ok(date) => {
          events.push(
            CalendarEvent::from_record(
              record, date
            )
          );
        }
        | Err(err) => {
          match policy {
            | InvalidEventPolicy::Abort => {
              return Err(err);
            }
            | InvalidEventPolicy::Skip => {
              warn!(
                id = %err.id,
                position = err.position,
                raw = %err.raw,
                reason = %err.reason,
                "skipping event with invalid date"
              );
              skipped.push(err);
            }
          }
        }
      }
    }

    let mut index =
      Self::from_events(events);
    index.skipped = skipped;
    Ok(index)
  }

  #[tracing::instrument(skip(events), fields(events = events.len()))]
  pub fn from_events(
    events: Vec<CalendarEvent>
  ) -> Self {
    let mut by_date: HashMap<
      NaiveDate,
      Vec<usize>
    > = HashMap::new();
    let mut by_id = HashMap::new();

    for (position, event) in
      events.iter().enumerate()
    {
      by_date
        .entry(event.date)
        .or_default()
        .push(position);

      if by_id.contains_key(&event.id) {
        warn!(
          id = %event.id,
          position,
          "duplicate event id; lookups resolve to the first occurrence"
        );
      } else {
        by_id.insert(
          event.id.clone(),
          position
        );
      }
    }

    let mut dates: Vec<NaiveDate> =
      by_date.keys().copied().collect();
    dates.sort_unstable();

    info!(
      events = events.len(),
      distinct_dates = dates.len(),
      "built event index"
    );

    Self {
      events,
      by_date,
      dates,
      by_id,
      skipped: vec![]
    }
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.events.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.events.is_empty()
  }

  /// The backing snapshot in source
  /// order.
  #[must_use]
  pub fn events(
    &self
  ) -> &[CalendarEvent] {
    &self.events
  }

  /// Events left out under
  /// [`InvalidEventPolicy::Skip`].
  #[must_use]
  pub fn skipped(
    &self
  ) -> &[InvalidEventError] {
    &self.skipped
  }

  /// Distinct dates that carry at least
  /// one event, ascending.
  #[must_use]
  pub fn dates(&self) -> &[NaiveDate] {
    &self.dates
  }

  /// Snapshot positions of the events
  /// dated `date`, in source order.
  #[must_use]
  pub fn positions_on(
    &self,
    date: NaiveDate
  ) -> &[usize] {
    self
      .by_date
      .get(&date)
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// The events dated `date`, lazily,
  /// in source order.
  pub fn index_of(
    &self,
    date: NaiveDate
  ) -> impl Iterator<Item = &CalendarEvent>
  {
    self
      .positions_on(date)
      .iter()
      .map(|&position| {
        &self.events[position]
      })
  }

  #[must_use]
  pub fn events_on(
    &self,
    date: NaiveDate
  ) -> Vec<&CalendarEvent> {
    self.index_of(date).collect()
  }

  /// Events strictly after `date`,
  /// ascending by date; source order
  /// within a date.
  #[must_use]
  pub fn events_after(
    &self,
    date: NaiveDate
  ) -> Vec<&CalendarEvent> {
    let start = self
      .dates
      .partition_point(|d| *d <= date);

    let out: Vec<&CalendarEvent> = self
      .dates[start..]
      .iter()
      .flat_map(|d| self.events_on(*d))
      .collect();

    debug!(
      after = %date,
      count = out.len(),
      "resolved upcoming events"
    );
    out
  }

  #[must_use]
  pub fn get(
    &self,
    id: &str
  ) -> Option<&CalendarEvent> {
    self
      .by_id
      .get(id)
      .map(|&position| {
        &self.events[position]
      })
  }
}

fn normalize_date(
  record: &EventRecord,
  position: usize
) -> Result<NaiveDate, InvalidEventError>
{
  let raw = record.date.trim();
  let reason = if raw.is_empty() {
    InvalidDateReason::Missing
  } else if let Some(date) =
    parse_calendar_date(raw)
  {
    return Ok(date);
  } else {
    InvalidDateReason::Unparseable
  };

  Err(InvalidEventError {
    id: record.id.clone(),
    position,
    raw: record.date.clone(),
    reason
  })
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use chrono::NaiveDate;

  use super::*;
  use crate::date::add_days;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  fn record(
    id: &str,
    raw_date: &str
  ) -> EventRecord {
    EventRecord {
      id:          id.to_string(),
      title:       format!("title {id}"),
      contact:     None,
      kind:        "meeting".to_string(),
      date:        raw_date.to_string(),
      time:        String::new(),
      duration:    String::new(),
      location:    String::new(),
      description: String::new(),
      attendees:   vec![],
      status:      "confirmed"
        .to_string(),
      extra:       BTreeMap::new()
    }
  }

  fn ids(
    events: &[&CalendarEvent]
  ) -> Vec<String> {
    events
      .iter()
      .map(|event| event.id.clone())
      .collect()
  }

  #[test]
  fn groups_events_by_date_in_source_order(
  ) {
    let index = EventIndex::build(
      vec![
        record("a", "2024-01-16"),
        record("b", "2024-01-17"),
        record("c", "2024-01-16"),
      ],
      InvalidEventPolicy::Abort
    )
    .expect("valid snapshot");

    assert_eq!(
      index.positions_on(date(2024, 1, 16)),
      &[0, 2]
    );
    assert_eq!(
      index
        .index_of(date(2024, 1, 16))
        .map(|event| event.id.as_str())
        .collect::<Vec<_>>(),
      vec!["a", "c"]
    );
    assert_eq!(
      index
        .index_of(date(2024, 1, 18))
        .count(),
      0
    );
    assert_eq!(
      ids(
        &index
          .events_on(date(2024, 1, 16))
      ),
      vec!["a", "c"]
    );
    assert!(
      index
        .events_on(date(2024, 1, 18))
        .is_empty()
    );
  }

  #[test]
  fn abort_policy_fails_on_first_invalid_event(
  ) {
    let err = EventIndex::build(
      vec![
        record("ok", "2024-01-16"),
        record("bad", "16/01/2024"),
        record("empty", ""),
      ],
      InvalidEventPolicy::Abort
    )
    .expect_err("invalid date");

    assert_eq!(err.id, "bad");
    assert_eq!(err.position, 1);
    assert_eq!(
      err.reason,
      InvalidDateReason::Unparseable
    );
  }

  #[test]
  fn skip_policy_drops_and_records_invalid_events(
  ) {
    let index = EventIndex::build(
      vec![
        record("ok", "2024-01-16"),
        record("bad", "2024-02-30"),
        record("empty", "  "),
      ],
      InvalidEventPolicy::Skip
    )
    .expect("skip never fails");

    assert_eq!(index.len(), 1);
    assert_eq!(index.skipped().len(), 2);
    assert_eq!(
      index.skipped()[1].reason,
      InvalidDateReason::Missing
    );
    assert!(index.get("bad").is_none());
  }

  #[test]
  fn events_after_is_strict_and_ascending(
  ) {
    let index = EventIndex::build(
      vec![
        record("late", "2024-03-01"),
        record("today", "2024-01-16"),
        record("next-a", "2024-01-17"),
        record("past", "2023-12-31"),
        record("next-b", "2024-01-17"),
      ],
      InvalidEventPolicy::Abort
    )
    .expect("valid snapshot");

    let upcoming = index
      .events_after(date(2024, 1, 16));
    assert_eq!(
      ids(&upcoming),
      vec!["next-a", "next-b", "late"]
    );
    assert!(upcoming.iter().all(|e| {
      e.date > date(2024, 1, 16)
    }));
  }

  #[test]
  fn lookup_matches_full_scan_for_every_date(
  ) {
    let base = date(2024, 1, 1);
    let events: Vec<CalendarEvent> = (0
      ..200_i64)
      .map(|i| {
        CalendarEvent::new(
          format!("e{i}"),
          "sample",
          add_days(base, (i * 7) % 45)
        )
      })
      .collect();
    let index = EventIndex::from_events(
      events.clone()
    );

    for offset in -5_i64..60 {
      let day = add_days(base, offset);
      let naive: Vec<&CalendarEvent> =
        events
          .iter()
          .filter(|e| e.date == day)
          .collect();
      assert_eq!(
        index.events_on(day),
        naive
      );

      let after = index.events_after(day);
      assert!(
        after.iter().all(|e| e.date > day)
      );
      assert!(after.windows(2).all(|w| {
        w[0].date <= w[1].date
      }));
      assert_eq!(
        after.len(),
        events
          .iter()
          .filter(|e| e.date > day)
          .count()
      );
    }
  }

  #[test]
  fn duplicate_ids_resolve_to_first_occurrence(
  ) {
    let index = EventIndex::from_events(
      vec![
        CalendarEvent::new(
          "dup",
          "first",
          date(2024, 1, 16)
        ),
        CalendarEvent::new(
          "dup",
          "second",
          date(2024, 1, 17)
        ),
      ]
    );

    assert_eq!(
      index
        .get("dup")
        .map(|e| e.title.as_str()),
      Some("first")
    );
    assert_eq!(
      index
        .events_on(date(2024, 1, 17))
        .len(),
      1
    );
  }

  #[test]
  fn empty_index_answers_every_query() {
    let index = EventIndex::empty();
    assert!(index.is_empty());
    assert!(
      index
        .events_on(date(2024, 1, 16))
        .is_empty()
    );
    assert!(
      index
        .events_after(date(2024, 1, 16))
        .is_empty()
    );
  }
}
