use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  TimeDelta,
  NaiveDate,
  NaiveTime,
  Weekday
};
use regex::Regex;

/// A calendar month. Always a valid
/// year/month pair: every constructor
/// and every shift keeps `month` in
/// `1..=12`, and the month's full
/// 42-day grid (up to 6 days before
/// the 1st, 41 after) stays inside
/// chrono's date range. That makes the
/// first month February of
/// `NaiveDate::MIN`'s year and the last
/// November of `NaiveDate::MAX`'s.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
)]
pub struct YearMonth {
  year:  i32,
  month: u32
}

impl YearMonth {
  #[must_use]
  pub fn new(
    year: i32,
    month: u32
  ) -> Option<Self> {
    let first = NaiveDate::from_ymd_opt(
      year, month, 1
    )?;
    let fits = TimeDelta::try_days(6)
      .and_then(|d| {
        first.checked_sub_signed(d)
      })
      .zip(
        TimeDelta::try_days(41).and_then(
          |d| first.checked_add_signed(d)
        )
      )
      .is_some();
    fits.then_some(Self { year, month })
  }

  /// Earliest representable month.
  #[must_use]
  pub fn min() -> Self {
    Self {
      year:  NaiveDate::MIN.year(),
      month: 2
    }
  }

  /// Latest representable month.
  #[must_use]
  pub fn max() -> Self {
    Self {
      year:  NaiveDate::MAX.year(),
      month: 11
    }
  }

  /// The month containing `date`,
  /// clamped to [`Self::min`] ..=
  /// [`Self::max`].
  #[must_use]
  pub fn of(date: NaiveDate) -> Self {
    Self {
      year:  date.year(),
      month: date.month()
    }
    .clamp(Self::min(), Self::max())
  }

  #[must_use]
  pub fn year(self) -> i32 {
    self.year
  }

  #[must_use]
  pub fn month(self) -> u32 {
    self.month
  }

  #[must_use]
  pub fn first_day(self) -> NaiveDate {
    NaiveDate::from_ymd_opt(
      self.year, self.month, 1
    )
    .unwrap_or(NaiveDate::MIN)
  }

  #[must_use]
  pub fn last_day(self) -> NaiveDate {
    let (year, month) = if self.month == 12
    {
      (self.year + 1, 1)
    } else {
      (self.year, self.month + 1)
    };
    NaiveDate::from_ymd_opt(
      year, month, 1
    )
    .and_then(|next| next.pred_opt())
    .unwrap_or(NaiveDate::MAX)
  }

  #[must_use]
  pub fn days_in_month(self) -> u32 {
    self.last_day().day()
  }

  #[must_use]
  pub fn contains(
    self,
    date: NaiveDate
  ) -> bool {
    date.year() == self.year
      && date.month() == self.month
  }

  /// Moves by `months`, rolling the
  /// year over in either direction.
  /// Months outside [`Self::min`] ..=
  /// [`Self::max`] leave `self`
  /// unchanged.
  #[must_use]
  pub fn shift(
    self,
    months: i32
  ) -> Self {
    let total = i64::from(self.year)
      * 12
      + i64::from(self.month)
      - 1
      + i64::from(months);
    let year = total.div_euclid(12);
    let month =
      total.rem_euclid(12) as u32 + 1;

    i32::try_from(year)
      .ok()
      .and_then(|year| {
        Self::new(year, month)
      })
      .unwrap_or(self)
  }

  #[must_use]
  pub fn succ(self) -> Self {
    self.shift(1)
  }

  #[must_use]
  pub fn pred(self) -> Self {
    self.shift(-1)
  }

  /// Display title, e.g. `January 2024`.
  #[must_use]
  pub fn title(self) -> String {
    self
      .first_day()
      .format("%B %Y")
      .to_string()
  }
}

impl fmt::Display for YearMonth {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}",
      self.year, self.month
    )
  }
}

impl FromStr for YearMonth {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    let (year, month) = s
      .trim()
      .split_once('-')
      .ok_or_else(|| {
        anyhow!(
          "expected YYYY-MM, got: {s}"
        )
      })?;
    let year: i32 = year
      .parse()
      .with_context(|| {
        format!("invalid year in {s}")
      })?;
    let month: u32 = month
      .parse()
      .with_context(|| {
        format!("invalid month in {s}")
      })?;
    Self::new(year, month).ok_or_else(
      || {
        anyhow!(
          "month out of range: {s}"
        )
      }
    )
  }
}

/// Returns `date` unchanged when the
/// result would leave chrono's range.
#[must_use]
pub fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  TimeDelta::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    })
    .unwrap_or(date)
}

/// Like [`add_days`], but an offset
/// outside chrono's range is an error.
fn offset_days(
  date: NaiveDate,
  days: i64
) -> anyhow::Result<NaiveDate> {
  TimeDelta::try_days(days)
    .and_then(|delta| {
      date.checked_add_signed(delta)
    })
    .ok_or_else(|| {
      anyhow!(
        "relative date out of range: \
         {days} days from {date}"
      )
    })
}

/// Shifts `date` by whole months,
/// clamping the day to the target
/// month's length (Jan 31 + 1 month is
/// Feb 28/29).
#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let target =
    YearMonth::of(date).shift(months);
  let day = date
    .day()
    .min(target.days_in_month());
  NaiveDate::from_ymd_opt(
    target.year(),
    target.month(),
    day
  )
  .unwrap_or(date)
}

#[must_use]
pub fn start_of_week(
  day: NaiveDate,
  week_start: Weekday
) -> NaiveDate {
  let day_idx = day
    .weekday()
    .num_days_from_monday()
    as i64;
  let start_idx = week_start
    .num_days_from_monday()
    as i64;
  let diff =
    (7 + day_idx - start_idx) % 7;
  add_days(day, -diff)
}

/// Parses a configured week start.
/// Only `monday` selects Monday; every
/// other value keeps the Sunday default.
#[must_use]
pub fn parse_week_start(
  raw: &str
) -> Weekday {
  match parse_weekday_name(
    &raw.trim().to_ascii_lowercase()
  ) {
    | Some(Weekday::Mon) => Weekday::Mon,
    | _ => Weekday::Sun
  }
}

/// Normalizes an event date as stored
/// in a snapshot: `YYYY-MM-DD`, or an
/// RFC 3339 timestamp whose calendar
/// date is taken in its own offset.
#[must_use]
pub fn parse_calendar_date(
  raw: &str
) -> Option<NaiveDate> {
  let token = raw.trim();
  if token.is_empty() {
    return None;
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Some(date);
  }

  DateTime::parse_from_rfc3339(token)
    .ok()
    .map(|dt| dt.date_naive())
}

#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" | "now" => {
      return Ok(today);
    }
    | "tomorrow" => {
      return Ok(add_days(today, 1));
    }
    | "yesterday" => {
      return Ok(add_days(today, -1));
    }
    | _ => {}
  }

  if let Some(target_weekday) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today,
      target_weekday
    ));
  }

  if let Some(target_month) =
    parse_month_name(&lower)
  {
    return YearMonth::new(
      today.year(),
      target_month
    )
    .map(YearMonth::first_day)
    .ok_or_else(|| {
      anyhow!(
        "invalid month value: \
         {target_month}"
      )
    });
  }

  if let Some(caps) = relative_re()
    .and_then(|re| re.captures(token))
  {
    let sign = caps
      .name("sign")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative sign")
      })?;
    let num: i64 = caps
      .name("num")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!(
          "missing relative amount"
        )
      })?
      .parse()
      .context(
        "invalid relative number"
      )?;
    let unit = caps
      .name("unit")
      .map(|m| m.as_str())
      .ok_or_else(|| {
        anyhow!("missing relative unit")
      })?;

    let signed =
      if sign == "-" { -num } else { num };

    return match unit {
      | "d" => offset_days(today, signed),
      | "w" => {
        let days = signed
          .checked_mul(7)
          .ok_or_else(|| {
            anyhow!(
              "relative date out of \
               range: {token}"
            )
          })?;
        offset_days(today, days)
      }
      | "m" => {
        let months =
          i32::try_from(signed).context(
            "relative month offset \
             out of range"
          )?;
        let current = YearMonth::of(today);
        if months != 0
          && current.shift(months)
            == current
        {
          return Err(anyhow!(
            "relative date out of \
             range: {token}"
          ));
        }
        Ok(shift_months(today, months))
      }
      | _ => {
        Err(anyhow!(
          "unknown relative unit: \
           {unit}"
        ))
      }
    };
  }

  if let Some(date) =
    parse_calendar_date(token)
  {
    return Ok(date);
  }

  if let Ok(month) =
    token.parse::<YearMonth>()
  {
    return Ok(month.first_day());
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .with_context(|| {
    "supported formats: \
     today/tomorrow/yesterday, weekday \
     names (e.g. monday), month names \
     (e.g. march), +Nd/+Nw/+Nm, \
     YYYY-MM-DD, YYYY-MM, RFC3339"
  })
}

/// Parses `3:23pm`, `3:23 PM` or
/// `15:23`.
#[must_use]
pub fn parse_clock_time(
  token: &str
) -> Option<NaiveTime> {
  let captures = clock_re()?
    .captures(token.trim())?;

  let raw_hour = captures
    .name("hour")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  let minute = captures
    .name("minute")?
    .as_str()
    .parse::<u32>()
    .ok()?;
  if minute > 59 {
    return None;
  }

  let hour = if let Some(ampm_match) =
    captures.name("ampm")
  {
    if raw_hour == 0 || raw_hour > 12 {
      return None;
    }
    match ampm_match
      .as_str()
      .to_ascii_lowercase()
      .replace('.', "")
      .as_str()
    {
      | "am" => raw_hour % 12,
      | "pm" => raw_hour % 12 + 12,
      | _ => return None
    }
  } else {
    if raw_hour > 23 {
      return None;
    }
    raw_hour
  };

  NaiveTime::from_hms_opt(
    hour, minute, 0
  )
}

fn relative_re() -> Option<&'static Regex>
{
  static RELATIVE_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  RELATIVE_RE
    .get_or_init(|| {
      Regex::new(
        r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[dwm])$"
      )
      .map_err(|err| {
        tracing::error!(
          error = %err,
          "relative date regex failed to compile"
        );
      })
      .ok()
    })
    .as_ref()
}

fn clock_re() -> Option<&'static Regex> {
  static CLOCK_RE: OnceLock<
    Option<Regex>
  > = OnceLock::new();
  CLOCK_RE
    .get_or_init(|| {
      Regex::new(
        r"(?i)^(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap]\.?m\.?)?$"
      )
      .map_err(|err| {
        tracing::error!(
          error = %err,
          "clock time regex failed to compile"
        );
      })
      .ok()
    })
    .as_ref()
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as i64;
  let target_idx = target
    .num_days_from_monday()
    as i64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  add_days(from, delta)
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}
