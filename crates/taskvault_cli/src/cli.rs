//! CLI argument definitions for `tv`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// TaskVault - capture, categorize and archive tasks locally, optionally
/// behind a PIN.
#[derive(Parser, Debug)]
#[command(name = "tv")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Database file (defaults to the per-user data directory).
    #[arg(long = "db", global = true, env = "TASKVAULT_DB_PATH")]
    pub db_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture a new task
    Add {
        /// Task title; surrounding whitespace is trimmed
        title: Vec<String>,
        /// Category id (defaults to the first category)
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List active tasks, or archived ones with --archived
    List {
        /// Only tasks in this category id
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long)]
        archived: bool,
    },

    /// Complete and archive a task
    Done { id: String },

    /// Restore a task completed less than a minute ago
    Undo { id: String },

    /// Permanently delete an active task
    Delete {
        id: String,
        /// Skip the confirmation requirement
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Category management
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// PIN protection
    Pin {
        #[command(subcommand)]
        command: PinCommands,
    },

    /// Start a 30-minute session
    Unlock {
        #[arg(long, env = "TASKVAULT_PIN", hide_env_values = true)]
        pin: String,
    },

    /// End the current session
    Lock,

    /// Deliver a host auto-lock signal (for screen-lock or logout hooks)
    Signal {
        #[arg(value_enum)]
        kind: SignalKind,
    },

    /// Write a JSON backup
    Export {
        /// Output file (defaults to tasks-backup-<ms>.json)
        path: Option<PathBuf>,
    },

    /// Replace all data with a JSON backup
    Import {
        path: PathBuf,
        /// Confirm the destructive replace
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show collection counts and lock state
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Add a category (color is assigned from the palette)
    Add { name: Vec<String> },
    /// List categories
    List,
    /// Delete a category; its tasks keep the category id
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum PinCommands {
    /// Enable PIN protection
    Set {
        #[arg(long, env = "TASKVAULT_PIN", hide_env_values = true)]
        pin: String,
        /// Repeat the PIN
        #[arg(long)]
        confirm: String,
    },
    /// Disable PIN protection after re-entering the current PIN
    Remove {
        #[arg(long, env = "TASKVAULT_PIN", hide_env_values = true)]
        pin: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum SignalKind {
    Hidden,
    Unloading,
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::{CommandFactory, Parser};

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_joins_title_words() {
        let cli = Cli::parse_from(["tv", "add", "buy", "milk", "-c", "personal"]);
        match cli.command {
            Commands::Add { title, category } => {
                assert_eq!(title.join(" "), "buy milk");
                assert_eq!(category.as_deref(), Some("personal"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
