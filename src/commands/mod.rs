mod availability;
mod exceptions;
mod render;
mod schema;

use clap::{Parser, Subcommand};
use noura_availability::components::availability::TimeCodec;
use noura_availability::components::AvailabilitySyncHandle;
use noura_availability::error::{other_error, AppResult};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "noura-availability")]
#[command(about = "Inspect and edit weekly availability and exception dates", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the weekly pattern in local time
    Weekly {
        /// Print an editable JSON schedule instead
        #[arg(long)]
        json: bool,
    },

    /// Show exception dates in local time
    Exceptions {
        /// Print editable JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Show the effective availability on one date
    Resolve {
        /// Date in YYYY-MM-DD format
        #[arg(long)]
        date: String,
    },

    /// Show the effective availability for a Sunday-to-Saturday week
    Week {
        /// Any date in the week, defaults to today
        #[arg(long)]
        date: Option<String>,
    },

    /// Sync an edited exception list (local times) to the server
    ApplyExceptions {
        #[arg(long)]
        file: PathBuf,

        /// Only print the planned operations
        #[arg(long)]
        dry_run: bool,
    },

    /// Save a weekly schedule (local times) or a list of draft actions
    SetWeekly {
        /// JSON list of days with intervals
        #[arg(long, conflicts_with = "actions", required_unless_present = "actions")]
        file: Option<PathBuf>,

        /// JSON list of draft actions applied to the current schedule
        #[arg(long)]
        actions: Option<PathBuf>,

        /// Only print the planned operations
        #[arg(long)]
        dry_run: bool,
    },

    /// Format typed digits as a time and check it
    CheckTime { value: String },

    /// Print JSON Schemas of the wire types
    Schema,
}

impl Command {
    /// Whether the command needs configuration and the API
    pub fn needs_remote(&self) -> bool {
        !matches!(self, Command::CheckTime { .. } | Command::Schema)
    }
}

/// Shared state for commands
pub struct CommandContext {
    pub sync: AvailabilitySyncHandle,
    pub codec: TimeCodec<chrono_tz::Tz>,
}

/// Run a command that talks to the API
pub async fn execute(command: Command, ctx: &CommandContext) -> AppResult<()> {
    match command {
        Command::Weekly { json } => availability::weekly(ctx, json).await,
        Command::Exceptions { json } => exceptions::list(ctx, json).await,
        Command::Resolve { date } => availability::resolve(ctx, &date).await,
        Command::Week { date } => availability::week(ctx, date.as_deref()).await,
        Command::ApplyExceptions { file, dry_run } => {
            exceptions::apply(ctx, &file, dry_run).await
        }
        Command::SetWeekly {
            file,
            actions,
            dry_run,
        } => availability::set_weekly(ctx, file.as_deref(), actions.as_deref(), dry_run).await,
        Command::CheckTime { .. } | Command::Schema => execute_offline(command),
    }
}

/// Run a command that needs neither configuration nor the API
pub fn execute_offline(command: Command) -> AppResult<()> {
    match command {
        Command::CheckTime { value } => {
            availability::check_time(&value);
            Ok(())
        }
        Command::Schema => schema::print(),
        _ => Err(other_error("command needs the scheduling API")),
    }
}

/// Read a JSON file into `T`
fn read_json<T: DeserializeOwned>(path: &Path) -> AppResult<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Print a value as pretty JSON
fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
