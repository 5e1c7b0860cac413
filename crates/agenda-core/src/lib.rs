pub mod classify;
pub mod cli;
pub mod clock;
pub mod config;
pub mod date;
pub mod event;
pub mod grid;
pub mod index;
pub mod navigation;
pub mod render;
pub mod selection;
pub mod source;
pub mod view;

use std::ffi::OsString;
use std::io::{
  self,
  Write
};

use anyhow::{
  Context,
  anyhow
};
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::cli::Command;
use crate::clock::EvaluationClock;
use crate::index::EventIndex;
use crate::navigation::NavigationController;
use crate::selection::SelectionState;
use crate::view::CalendarViewModel;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting agenda CLI"
  );

  let mut cfg =
    config::CalendarConfig::load(
      cli.config.as_deref()
    )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .iter()
      .map(|kv| {
        (kv.key.clone(), kv.value.clone())
      })
  )?;

  let host_today = EvaluationClock::System(
    cfg.timezone()
  )
  .today();
  let clock = match cli.today.as_deref() {
    | Some(expr) => {
      EvaluationClock::Fixed(
        date::parse_date_expr(
          expr, host_today
        )
        .context(
          "invalid --today date"
        )?
      )
    }
    | None => {
      EvaluationClock::System(
        cfg.timezone()
      )
    }
  };
  let today = clock.today();
  debug!(today = %today, ?clock, "resolved evaluation date");

  let records = match cli
    .events
    .clone()
    .or_else(|| cfg.events_path())
  {
    | Some(path) => {
      source::load_snapshot(&path)
        .with_context(|| {
          format!(
            "failed to load events from \
             {}",
            path.display()
          )
        })?
    }
    | None => {
      warn!(
        "no event snapshot configured; \
         showing an empty calendar"
      );
      Vec::new()
    }
  };
  let index = EventIndex::build(
    records,
    cfg.policies.invalid_events
  )?;

  let mut nav =
    NavigationController::new(today);
  if let Some(expr) = cli.at.as_deref() {
    let focus =
      date::parse_date_expr(expr, today)
        .context("invalid --at date")?;
    nav = NavigationController::at(
      focus,
      nav.granularity()
    );
  }
  if let Some(granularity) = cli.view {
    nav.set_granularity(granularity);
  }
  nav.step(cli.step);

  let command = cli.command();
  let mut selection =
    SelectionState::new();
  if let Some(id) = cli.select.as_deref()
  {
    selection.select(id);
  }
  if let Command::Show { id } = &command
  {
    selection.select(id.as_str());
  }

  let view = CalendarViewModel::build(
    &nav.state(),
    &index,
    &selection,
    today,
    &cfg.view_options()
  );

  let renderer =
    render::Renderer::new(cfg.color);
  let mut out = io::stdout().lock();
  match &command {
    | Command::Month => {
      renderer
        .write_calendar(&mut out, &view)?;
    }
    | Command::Today => {
      renderer
        .write_today(&mut out, &view)?;
    }
    | Command::Upcoming => {
      renderer
        .write_upcoming(&mut out, &view)?;
    }
    | Command::Show { id } => {
      let detail = view
        .selected_event_detail
        .as_ref()
        .ok_or_else(|| {
          anyhow!(
            "no event with id {id} in the \
             snapshot"
          )
        })?;
      renderer
        .write_detail(&mut out, detail)?;
    }
  }
  out.flush()?;

  info!("done");
  Ok(())
}
