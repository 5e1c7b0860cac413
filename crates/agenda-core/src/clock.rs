use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use chrono_tz::Tz;

/// Source of the evaluation instant's
/// calendar date. The core never reads
/// the host clock itself; callers pass
/// `today()` in.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum EvaluationClock {
  /// Host clock, read in the given
  /// timezone.
  System(Tz),
  /// Pinned date, for reproducible runs
  /// and tests.
  Fixed(NaiveDate)
}

impl EvaluationClock {
  #[must_use]
  pub fn today(&self) -> NaiveDate {
    match self {
      | Self::System(tz) => today_in(*tz),
      | Self::Fixed(date) => *date
    }
  }
}

#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
  date_in(Utc::now(), tz)
}

#[must_use]
pub fn date_in(
  now: DateTime<Utc>,
  tz: Tz
) -> NaiveDate {
  now.with_timezone(&tz).date_naive()
}

pub fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "parsed timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}
