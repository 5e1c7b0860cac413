use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::str::FromStr;

use anyhow::{
  Context,
  anyhow
};
use chrono::Weekday;
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{
  debug,
  info,
  warn
};

use crate::clock::parse_timezone;
use crate::date::parse_week_start;
use crate::index::InvalidEventPolicy;
use crate::view::{
  DEFAULT_CELL_EVENT_LIMIT,
  DEFAULT_UPCOMING_LIMIT,
  ViewOptions
};

pub const CONFIG_ENV_VAR: &str =
  "AGENDA_CONFIG";
const CONFIG_DIR_NAME: &str = "agenda";
const CONFIG_FILE_NAME: &str =
  "calendar.toml";
const DEFAULT_TIMEZONE: &str = "UTC";

fn default_version() -> u32 {
  1
}

fn default_timezone() -> String {
  DEFAULT_TIMEZONE.to_string()
}

fn default_week_start() -> String {
  "sunday".to_string()
}

fn default_upcoming_limit() -> usize {
  DEFAULT_UPCOMING_LIMIT
}

fn default_cell_event_limit() -> usize {
  DEFAULT_CELL_EVENT_LIMIT
}

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
pub enum ColorMode {
  #[default]
  Auto,
  On,
  Off
}

impl FromStr for ColorMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "auto" => Ok(Self::Auto),
      | "on" | "yes" | "true" | "1" => {
        Ok(Self::On)
      }
      | "off" | "no" | "false" | "0" => {
        Ok(Self::Off)
      }
      | other => {
        Err(anyhow!(
          "invalid color setting: \
           {other}"
        ))
      }
    }
  }
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarPolicies {
  #[serde(default = "default_week_start")]
  pub week_start:       String,
  #[serde(
    default = "default_upcoming_limit"
  )]
  pub upcoming_limit:   usize,
  #[serde(
    default = "default_cell_event_limit"
  )]
  pub cell_event_limit: usize,
  #[serde(default)]
  pub invalid_events:   InvalidEventPolicy
}

impl Default for CalendarPolicies {
  fn default() -> Self {
    Self {
      week_start:       default_week_start(
      ),
      upcoming_limit:
        default_upcoming_limit(),
      cell_event_limit:
        default_cell_event_limit(),
      invalid_events:
        InvalidEventPolicy::default()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Deserialize,
)]
pub struct EventsSection {
  pub path: Option<PathBuf>
}

#[derive(
  Debug, Clone, PartialEq, Deserialize,
)]
pub struct CalendarConfig {
  #[serde(default = "default_version")]
  pub version:      u32,
  #[serde(default = "default_timezone")]
  pub timezone:     String,
  #[serde(default)]
  pub color:        ColorMode,
  #[serde(default)]
  pub policies:     CalendarPolicies,
  #[serde(default)]
  pub events:       EventsSection,
  #[serde(skip)]
  pub loaded_files: Vec<PathBuf>
}

impl Default for CalendarConfig {
  fn default() -> Self {
    Self {
      version:      default_version(),
      timezone:     default_timezone(),
      color:        ColorMode::default(),
      policies:
        CalendarPolicies::default(),
      events:       EventsSection::default(
      ),
      loaded_files: vec![]
    }
  }
}

impl CalendarConfig {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let Some(path) =
      resolve_config_path(
        config_override
      )?
    else {
      warn!(
        "no calendar.toml found; \
         using defaults"
      );
      return Ok(Self::default());
    };

    let path = expand_tilde(&path);
    info!(config = %path.display(), "loading calendar config");
    let raw = fs::read_to_string(&path)
      .with_context(|| {
        format!(
          "failed to read {}",
          path.display()
        )
      })?;

    let mut cfg = Self::from_toml_str(
      &raw
    )
    .with_context(|| {
      format!(
        "failed to parse {}",
        path.display()
      )
    })?;
    cfg.loaded_files.push(path);
    Ok(cfg)
  }

  pub fn from_toml_str(
    raw: &str
  ) -> anyhow::Result<Self> {
    let mut cfg: Self =
      toml::from_str(raw)?;
    cfg.sanitize();
    info!(
      version = cfg.version,
      timezone = %cfg.timezone,
      week_start = %cfg.policies.week_start,
      "loaded calendar config"
    );
    Ok(cfg)
  }

  /// Applies `key=value` overrides on
  /// top of the loaded file. A leading
  /// `rc.` on the key is ignored.
  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) -> anyhow::Result<()>
  where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .trim()
        .to_string();
      let value = v.trim().to_string();
      debug!(key = %key, value = %value, "applying override");

      match key.as_str() {
        | "timezone" => {
          self.timezone = value;
        }
        | "color" => {
          self.color = value.parse()?;
        }
        | "policies.week_start" => {
          self.policies.week_start =
            value;
        }
        | "policies.upcoming_limit" => {
          self.policies.upcoming_limit =
            parse_limit(&key, &value)?;
        }
        | "policies.cell_event_limit" => {
          self
            .policies
            .cell_event_limit =
            parse_limit(&key, &value)?;
        }
        | "policies.invalid_events" => {
          self.policies.invalid_events =
            value.parse()?;
        }
        | "events.path" => {
          self.events.path =
            Some(PathBuf::from(value));
        }
        | _ => {
          return Err(anyhow!(
            "unknown configuration \
             key: {key}"
          ));
        }
      }
    }

    self.sanitize();
    Ok(())
  }

  #[must_use]
  pub fn week_start(&self) -> Weekday {
    parse_week_start(
      &self.policies.week_start
    )
  }

  #[must_use]
  pub fn timezone(&self) -> Tz {
    parse_timezone(
      &self.timezone,
      "calendar.toml"
    )
    .unwrap_or(chrono_tz::UTC)
  }

  #[must_use]
  pub fn view_options(
    &self
  ) -> ViewOptions {
    ViewOptions {
      week_start:       self
        .week_start(),
      upcoming_limit:   self
        .policies
        .upcoming_limit,
      cell_event_limit: self
        .policies
        .cell_event_limit
    }
  }

  #[must_use]
  pub fn events_path(
    &self
  ) -> Option<PathBuf> {
    self
      .events
      .path
      .as_deref()
      .map(expand_tilde)
  }

  fn sanitize(&mut self) {
    if self
      .policies
      .week_start
      .trim()
      .is_empty()
    {
      self.policies.week_start =
        default_week_start();
    }

    if self.policies.upcoming_limit == 0
    {
      self.policies.upcoming_limit =
        default_upcoming_limit();
    }

    if self.policies.cell_event_limit
      == 0
    {
      self.policies.cell_event_limit =
        default_cell_event_limit();
    }

    if parse_timezone(
      &self.timezone,
      "calendar.toml"
    )
    .is_none()
    {
      tracing::error!(
        timezone = %self.timezone,
        "invalid timezone; falling back to UTC"
      );
      self.timezone = default_timezone();
    }
  }
}

fn parse_limit(
  key: &str,
  value: &str
) -> anyhow::Result<usize> {
  value.parse::<usize>().with_context(
    || {
      format!(
        "{key} must be a non-negative \
         integer, got: {value}"
      )
    }
  )
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
      return Ok(Some(PathBuf::from(
        trimmed
      )));
    }
  }

  let Some(config_dir) =
    dirs::config_dir()
  else {
    warn!(
      "cannot determine config \
       directory"
    );
    return Ok(None);
  };
  let candidate = config_dir
    .join(CONFIG_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

pub fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;

  use chrono::Weekday;

  use super::*;

  #[test]
  fn empty_file_uses_defaults() {
    let cfg =
      CalendarConfig::from_toml_str("")
        .expect("empty config");
    assert_eq!(
      cfg,
      CalendarConfig::default()
    );
    assert_eq!(
      cfg.view_options(),
      ViewOptions::default()
    );
  }

  #[test]
  fn parses_and_sanitizes_policies() {
    let cfg = CalendarConfig::from_toml_str(
      r#"
        timezone = "Not/AZone"
        color = "off"

        [policies]
        week_start = "monday"
        upcoming_limit = 0
        cell_event_limit = 4
        invalid_events = "abort"

        [events]
        path = "/srv/agenda/events.json"
      "#
    )
    .expect("valid toml");

    assert_eq!(cfg.timezone, "UTC");
    assert_eq!(cfg.color, ColorMode::Off);
    assert_eq!(
      cfg.week_start(),
      Weekday::Mon
    );
    assert_eq!(
      cfg.policies.upcoming_limit,
      DEFAULT_UPCOMING_LIMIT
    );
    assert_eq!(
      cfg.policies.cell_event_limit,
      4
    );
    assert_eq!(
      cfg.policies.invalid_events,
      InvalidEventPolicy::Abort
    );
    assert_eq!(
      cfg.events_path(),
      Some(PathBuf::from(
        "/srv/agenda/events.json"
      ))
    );
  }

  #[test]
  fn rejects_unknown_policy_values() {
    assert!(
      CalendarConfig::from_toml_str(
        "[policies]\ninvalid_events = \"explode\""
      )
      .is_err()
    );
  }

  #[test]
  fn overrides_apply_and_validate() {
    let mut cfg =
      CalendarConfig::default();
    cfg
      .apply_overrides(vec![
        (
          "rc.policies.week_start"
            .to_string(),
          "monday".to_string()
        ),
        (
          "policies.upcoming_limit"
            .to_string(),
          "5".to_string()
        ),
        (
          "timezone".to_string(),
          "Europe/Berlin".to_string()
        ),
      ])
      .expect("valid overrides");
    assert_eq!(
      cfg.week_start(),
      Weekday::Mon
    );
    assert_eq!(
      cfg.policies.upcoming_limit,
      5
    );
    assert_eq!(
      cfg.timezone(),
      chrono_tz::Europe::Berlin
    );

    assert!(
      cfg
        .apply_overrides(vec![(
          "policies.nope".to_string(),
          "1".to_string()
        )])
        .is_err()
    );
    assert!(
      cfg
        .apply_overrides(vec![(
          "policies.upcoming_limit"
            .to_string(),
          "-1".to_string()
        )])
        .is_err()
    );
  }
}
