use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::navigation::Granularity;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "agenda",
    version,
    about = "Month calendar and event agenda for the terminal",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Path to calendar.toml.
    #[arg(long = "config")]
    pub config: Option<PathBuf>,

    /// Event snapshot file (JSON array or .jsonl).
    #[arg(long = "events")]
    pub events: Option<PathBuf>,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append
    )]
    pub rc_overrides: Vec<KeyVal>,

    /// Evaluate as if this were the current date.
    #[arg(long = "today", value_name = "DATE")]
    pub today: Option<String>,

    /// Navigate to the period containing this date.
    #[arg(long = "at", value_name = "DATE")]
    pub at: Option<String>,

    #[arg(long = "view", value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Granularity>()))]
    pub view: Option<Granularity>,

    /// Periods to move forward, or back when negative.
    #[arg(long = "step", default_value_t = 0, allow_negative_numbers = true)]
    pub step: i32,

    #[arg(long = "select", value_name = "ID")]
    pub select: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Month grid with the today, upcoming and detail panels.
    Month,
    /// Events scheduled for today.
    Today,
    /// The next events after today.
    Upcoming,
    /// Details of one event.
    Show { id: String },
}

impl GlobalCli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Month)
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
