use chrono::{
  NaiveDate,
  Weekday
};

use crate::date::{
  YearMonth,
  add_days,
  start_of_week
};

pub const GRID_COLUMNS: usize = 7;
pub const GRID_ROWS: usize = 6;
/// Six full weeks cover every month,
/// including a 31-day month that starts
/// in the last column.
pub const GRID_CELLS: usize =
  GRID_COLUMNS * GRID_ROWS;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct DateGridGenerator {
  week_start: Weekday
}

impl Default for DateGridGenerator {
  fn default() -> Self {
    Self {
      week_start: Weekday::Sun
    }
  }
}

impl DateGridGenerator {
  #[must_use]
  pub fn new(
    week_start: Weekday
  ) -> Self {
    Self { week_start }
  }

  #[must_use]
  pub fn week_start(&self) -> Weekday {
    self.week_start
  }

  /// The first cell of the grid: the
  /// week-start day on or before the
  /// 1st of `month`.
  #[must_use]
  pub fn anchor(
    &self,
    month: YearMonth
  ) -> NaiveDate {
    start_of_week(
      month.first_day(),
      self.week_start
    )
  }

  /// Every [`YearMonth`] leaves room
  /// for all 42 cells, so the grid never
  /// repeats a date.
  #[must_use]
  pub fn generate_grid(
    &self,
    month: YearMonth
  ) -> [NaiveDate; GRID_CELLS] {
    let anchor = self.anchor(month);
    std::array::from_fn(|offset| {
      add_days(anchor, offset as i64)
    })
  }

  /// Column headers, rotated so the
  /// configured week start comes first.
  #[must_use]
  pub fn weekday_labels(
    &self
  ) -> [&'static str; GRID_COLUMNS] {
    let mut day = self.week_start;
    std::array::from_fn(|_| {
      let label = weekday_label(day);
      day = day.succ();
      label
    })
  }
}

fn weekday_label(
  day: Weekday
) -> &'static str {
  match day {
    | Weekday::Mon => "Mon",
    | Weekday::Tue => "Tue",
    | Weekday::Wed => "Wed",
    | Weekday::Thu => "Thu",
    | Weekday::Fri => "Fri",
    | Weekday::Sat => "Sat",
    | Weekday::Sun => "Sun"
  }
}
