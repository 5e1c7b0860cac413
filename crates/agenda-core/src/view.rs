use chrono::{
  NaiveDate,
  Weekday
};
use tracing::debug;

use crate::classify::{
  Presentation,
  classify
};
use crate::date::YearMonth;
use crate::event::{
  CalendarEvent,
  initials
};
use crate::grid::{
  DateGridGenerator,
  GRID_COLUMNS
};
use crate::index::EventIndex;
use crate::navigation::{
  Granularity,
  NavigationState
};
use crate::selection::SelectionState;

pub const DEFAULT_UPCOMING_LIMIT: usize =
  3;
pub const DEFAULT_CELL_EVENT_LIMIT:
  usize = 2;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct ViewOptions {
  pub week_start:       Weekday,
  pub upcoming_limit:   usize,
  pub cell_event_limit: usize
}

impl Default for ViewOptions {
  fn default() -> Self {
    Self {
      week_start:       Weekday::Sun,
      upcoming_limit:
        DEFAULT_UPCOMING_LIMIT,
      cell_event_limit:
        DEFAULT_CELL_EVENT_LIMIT
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedEvent<'a> {
  pub event:        &'a CalendarEvent,
  pub presentation: Presentation,
  pub selected:     bool
}

impl<'a> AnnotatedEvent<'a> {
  fn new(
    event: &'a CalendarEvent,
    selection: &SelectionState
  ) -> Self {
    Self {
      event,
      presentation: classify(event),
      selected: selection
        .is_selected(&event.id)
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell<'a> {
  pub date:             NaiveDate,
  pub in_current_month: bool,
  pub is_today:         bool,
  pub events:           Vec<AnnotatedEvent<'a>>
}

impl<'a> CalendarCell<'a> {
  /// The events that fit in the cell;
  /// the rest are summarized by
  /// [`Self::overflow_label`].
  #[must_use]
  pub fn visible_events(
    &self,
    limit: usize
  ) -> &[AnnotatedEvent<'a>] {
    &self.events
      [..self.events.len().min(limit)]
  }

  #[must_use]
  pub fn hidden_count(
    &self,
    limit: usize
  ) -> usize {
    self.events.len().saturating_sub(limit)
  }

  #[must_use]
  pub fn overflow_label(
    &self,
    limit: usize
  ) -> Option<String> {
    match self.hidden_count(limit) {
      | 0 => None,
      | hidden => {
        Some(format!("+{hidden} more"))
      }
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendeeBadge<'a> {
  pub name:     &'a str,
  pub initials: String
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDetail<'a> {
  pub event:          &'a CalendarEvent,
  pub presentation:   Presentation,
  pub attendee_count: usize,
  pub attendees:      Vec<AttendeeBadge<'a>>
}

impl<'a> EventDetail<'a> {
  fn new(event: &'a CalendarEvent) -> Self {
    Self {
      event,
      presentation: classify(event),
      attendee_count: event
        .attendee_count(),
      attendees: event
        .attendees
        .iter()
        .map(|name| {
          AttendeeBadge {
            name:     name.as_str(),
            initials: initials(name)
          }
        })
        .collect()
    }
  }
}

/// Everything a renderer needs for one
/// frame. Borrowed from the index and
/// rebuilt on demand; it owns no state.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarViewModel<'a> {
  pub title:                 String,
  pub reference_month:       YearMonth,
  pub granularity:           Granularity,
  /// First and last day of the
  /// navigated period.
  pub period:
    (NaiveDate, NaiveDate),
  pub today:                 NaiveDate,
  pub weekday_labels:
    [&'static str; GRID_COLUMNS],
  pub cells:                 Vec<CalendarCell<'a>>,
  pub today_events:          Vec<AnnotatedEvent<'a>>,
  pub upcoming_events:       Vec<AnnotatedEvent<'a>>,
  /// Upcoming events before the display
  /// cap was applied.
  pub upcoming_total:        usize,
  pub cell_event_limit:      usize,
  pub selected_event_detail:
    Option<EventDetail<'a>>
}

impl<'a> CalendarViewModel<'a> {
  #[tracing::instrument(skip(navigation, index, selection, options), fields(month = %navigation.reference_month()))]
  pub fn build(
    navigation: &NavigationState,
    index: &'a EventIndex,
    selection: &SelectionState,
    today: NaiveDate,
    options: &ViewOptions
  ) -> Self {
    let generator =
      DateGridGenerator::new(
        options.week_start
      );
    let reference_month =
      navigation.reference_month();

    let cells = generator
      .generate_grid(reference_month)
      .into_iter()
      .map(|date| {
        CalendarCell {
          date,
          in_current_month:
            reference_month
              .contains(date),
          is_today: date == today,
          events: index
            .events_on(date)
            .into_iter()
            .map(|event| {
              AnnotatedEvent::new(
                event, selection
              )
            })
            .collect()
        }
      })
      .collect::<Vec<_>>();

    let today_events = index
      .events_on(today)
      .into_iter()
      .map(|event| {
        AnnotatedEvent::new(
          event, selection
        )
      })
      .collect::<Vec<_>>();

    let upcoming = index
      .events_after(today);
    let upcoming_total = upcoming.len();
    let upcoming_events = upcoming
      .into_iter()
      .take(options.upcoming_limit)
      .map(|event| {
        AnnotatedEvent::new(
          event, selection
        )
      })
      .collect::<Vec<_>>();

    let selected_event_detail = selection
      .resolve(index)
      .map(EventDetail::new);

    debug!(
      today = %today,
      today_events = today_events.len(),
      upcoming_shown = upcoming_events.len(),
      upcoming_total,
      selected = selected_event_detail.is_some(),
      "assembled calendar view"
    );

    Self {
      title: navigation
        .title(options.week_start),
      reference_month,
      granularity: navigation
        .granularity,
      period: navigation
        .period_window(options.week_start),
      today,
      weekday_labels: generator
        .weekday_labels(),
      cells,
      today_events,
      upcoming_events,
      upcoming_total,
      cell_event_limit: options
        .cell_event_limit,
      selected_event_detail
    }
  }

  /// The grid as six weeks of seven
  /// cells.
  pub fn rows(
    &self
  ) -> impl Iterator<Item = &[CalendarCell<'a>]>
  {
    self.cells.chunks(GRID_COLUMNS)
  }

  #[must_use]
  pub fn cell(
    &self,
    date: NaiveDate
  ) -> Option<&CalendarCell<'a>> {
    self
      .cells
      .iter()
      .find(|cell| cell.date == date)
  }
}
