use std::str::FromStr;

use anyhow::anyhow;
use chrono::{
  NaiveDate,
  Weekday
};
use tracing::debug;

use crate::date::{
  YearMonth,
  add_days,
  shift_months,
  start_of_week
};

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum Granularity {
  #[default]
  Month,
  Week,
  Day
}

impl Granularity {
  #[must_use]
  pub fn all() -> [Self; 3] {
    [Self::Month, Self::Week, Self::Day]
  }

  #[must_use]
  pub fn as_key(self) -> &'static str {
    match self {
      | Self::Month => "month",
      | Self::Week => "week",
      | Self::Day => "day"
    }
  }

  #[must_use]
  pub fn from_key(
    key: &str
  ) -> Option<Self> {
    match key.trim() {
      | "month" => Some(Self::Month),
      | "week" => Some(Self::Week),
      | "day" => Some(Self::Day),
      | _ => None
    }
  }
}

impl FromStr for Granularity {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    Self::from_key(
      &s.to_ascii_lowercase()
    )
    .ok_or_else(|| {
      anyhow!(
        "view must be one of month, \
         week, day; got: {s}"
      )
    })
  }
}

/// What is on screen: the focused day
/// (whose month is the reference month)
/// and the step unit.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct NavigationState {
  pub focus:       NaiveDate,
  pub granularity: Granularity
}

impl NavigationState {
  #[must_use]
  pub fn reference_month(
    &self
  ) -> YearMonth {
    YearMonth::of(self.focus)
  }

  /// First and last day of the period
  /// the focus falls in.
  #[must_use]
  pub fn period_window(
    &self,
    week_start: Weekday
  ) -> (NaiveDate, NaiveDate) {
    let focus = self.focus;
    match self.granularity {
      | Granularity::Month => {
        let month =
          self.reference_month();
        (
          month.first_day(),
          month.last_day()
        )
      }
      | Granularity::Week => {
        let start = start_of_week(
          focus, week_start
        );
        (start, add_days(start, 6))
      }
      | Granularity::Day => {
        (focus, focus)
      }
    }
  }

  #[must_use]
  pub fn title(
    &self,
    week_start: Weekday
  ) -> String {
    match self.granularity {
      | Granularity::Month => {
        self.reference_month().title()
      }
      | Granularity::Week => {
        let (start, end) =
          self.period_window(week_start);
        format!(
          "Week of {} - {}",
          start.format("%Y-%m-%d"),
          end.format("%Y-%m-%d")
        )
      }
      | Granularity::Day => {
        self
          .focus
          .format("%A, %Y-%m-%d")
          .to_string()
      }
    }
  }
}

#[derive(Debug, Clone)]
pub struct NavigationController {
  state: NavigationState
}

impl NavigationController {
  #[must_use]
  pub fn new(today: NaiveDate) -> Self {
    Self::at(today, Granularity::Month)
  }

  #[must_use]
  pub fn at(
    focus: NaiveDate,
    granularity: Granularity
  ) -> Self {
    Self {
      state: NavigationState {
        focus,
        granularity
      }
    }
  }

  #[must_use]
  pub fn state(&self) -> NavigationState {
    self.state
  }

  #[must_use]
  pub fn reference_month(
    &self
  ) -> YearMonth {
    self.state.reference_month()
  }

  #[must_use]
  pub fn granularity(
    &self
  ) -> Granularity {
    self.state.granularity
  }

  pub fn next_period(&mut self) {
    self.step(1);
  }

  pub fn previous_period(&mut self) {
    self.step(-1);
  }

  /// Applies `steps` next (positive) or
  /// previous (negative) transitions.
  pub fn step(&mut self, steps: i32) {
    let before = self.state.focus;
    self.state.focus = shift_focus(
      before,
      self.state.granularity,
      steps
    );
    debug!(
      from = %before,
      to = %self.state.focus,
      granularity = self.state.granularity.as_key(),
      steps,
      "shifted calendar focus"
    );
  }

  pub fn jump_to_today(
    &mut self,
    today: NaiveDate
  ) {
    debug!(today = %today, "jumped to today");
    self.state.focus = today;
  }

  pub fn set_granularity(
    &mut self,
    granularity: Granularity
  ) {
    debug!(
      granularity = granularity.as_key(),
      "changed granularity"
    );
    self.state.granularity =
      granularity;
  }

  #[must_use]
  pub fn period_window(
    &self,
    week_start: Weekday
  ) -> (NaiveDate, NaiveDate) {
    self.state.period_window(week_start)
  }

  #[must_use]
  pub fn title(
    &self,
    week_start: Weekday
  ) -> String {
    self.state.title(week_start)
  }
}

fn shift_focus(
  current: NaiveDate,
  granularity: Granularity,
  steps: i32
) -> NaiveDate {
  match granularity {
    | Granularity::Month => {
      shift_months(current, steps)
    }
    | Granularity::Week => {
      add_days(
        current,
        i64::from(steps) * 7
      )
    }
    | Granularity::Day => {
      add_days(
        current,
        i64::from(steps)
      )
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    NaiveDate,
    Weekday
  };

  use super::*;

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn month_steps_roll_over_the_year() {
    let mut nav = NavigationController::new(
      date(2023, 12, 15)
    );
    nav.next_period();
    assert_eq!(
      nav.reference_month(),
      YearMonth::new(2024, 1)
        .expect("valid month")
    );
    nav.previous_period();
    nav.previous_period();
    assert_eq!(
      nav.reference_month(),
      YearMonth::new(2023, 11)
        .expect("valid month")
    );
  }

  #[test]
  fn next_then_previous_restores_the_month(
  ) {
    for year in 2019..=2025 {
      for month in 1..=12 {
        for day in [1, 15, 28, 29, 30, 31]
        {
          let Some(start) =
            NaiveDate::from_ymd_opt(
              year, month, day
            )
          else {
            continue;
          };
          let mut nav =
            NavigationController::new(
              start
            );
          let before =
            nav.reference_month();
          nav.next_period();
          nav.previous_period();
          assert_eq!(
            nav.reference_month(),
            before,
            "start {start}"
          );
        }
      }
    }
  }

  #[test]
  fn week_and_day_steps_move_the_focus(
  ) {
    let mut nav =
      NavigationController::at(
        date(2024, 1, 30),
        Granularity::Week
      );
    nav.next_period();
    assert_eq!(
      nav.state().focus,
      date(2024, 2, 6)
    );

    nav.set_granularity(
      Granularity::Day
    );
    nav.step(-7);
    assert_eq!(
      nav.state().focus,
      date(2024, 1, 30)
    );
  }

  #[test]
  fn jump_to_today_is_idempotent() {
    let today = date(2024, 1, 16);
    let mut nav =
      NavigationController::new(
        date(1999, 6, 1)
      );
    nav.set_granularity(
      Granularity::Week
    );
    nav.jump_to_today(today);
    let once = nav.state();
    nav.jump_to_today(today);
    assert_eq!(nav.state(), once);
    assert_eq!(
      nav.reference_month(),
      YearMonth::of(today)
    );
    assert_eq!(
      nav.granularity(),
      Granularity::Week
    );
  }

  #[test]
  fn set_granularity_keeps_the_month() {
    let mut nav =
      NavigationController::new(
        date(2024, 3, 10)
      );
    let before = nav.reference_month();
    for granularity in
      Granularity::all()
    {
      nav.set_granularity(granularity);
      assert_eq!(
        nav.reference_month(),
        before
      );
    }
  }

  #[test]
  fn titles_follow_granularity() {
    let mut nav =
      NavigationController::new(
        date(2024, 1, 16)
      );
    assert_eq!(
      nav.title(Weekday::Sun),
      "January 2024"
    );
    nav.set_granularity(
      Granularity::Week
    );
    assert_eq!(
      nav.title(Weekday::Sun),
      "Week of 2024-01-14 - 2024-01-20"
    );
    nav.set_granularity(
      Granularity::Day
    );
    assert_eq!(
      nav.title(Weekday::Sun),
      "Tuesday, 2024-01-16"
    );
  }

  #[test]
  fn parses_granularity_keys() {
    assert_eq!(
      "Week"
        .parse::<Granularity>()
        .expect("valid view"),
      Granularity::Week
    );
    assert!(
      "quarter"
        .parse::<Granularity>()
        .is_err()
    );
  }
}
