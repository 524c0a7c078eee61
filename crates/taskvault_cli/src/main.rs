//! `tv` command-line front end for TaskVault.
//!
//! # Responsibility
//! - Parse commands and drive `taskvault_core` use-cases.
//! - Refuse task access while the lock gate requires a PIN.

mod cli;
mod render;

use clap::Parser;
use cli::{CategoryCommands, Cli, Commands, PinCommands, SignalKind};
use log::{error, info};
use render::relative_time;
use std::cell::Cell;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use taskvault_core::db::open_db;
use taskvault_core::{
    auto_lock, backup_file_name, init_logging, validate_new_pin, AppConfig, BackupDocument,
    Clock, LockGate, LockSignal, SessionStore, SignalHub, SqliteSessionStore,
    SqliteTaskRepository, SystemClock, TaskController, TaskRepository,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(path) = cli.db_path {
        config.db_path = path;
    }
    if let Err(err) = init_logging(&config.log_level, &config.log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    match run(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &AppConfig) -> CliResult<()> {
    let conn = open_db(&config.db_path)?;
    let gate = LockGate::new(SqliteSessionStore::new(&conn), SystemClock);

    match command {
        Commands::Unlock { pin } => unlock(&gate, &pin),
        Commands::Lock => {
            gate.lock()?;
            println!("Locked.");
            Ok(())
        }
        Commands::Signal { kind } => deliver_signal(&gate, kind),
        Commands::Pin { command } => pin_command(&gate, command),
        other => {
            ensure_unlocked(&gate)?;
            let mut controller =
                TaskController::new(SqliteTaskRepository::new(&conn), SystemClock);
            controller.initialize()?;
            task_command(&mut controller, &gate, other)
        }
    }
}

fn ensure_unlocked<S: SessionStore, C: Clock>(gate: &LockGate<S, C>) -> CliResult<()> {
    if gate.needs_unlock()? {
        return Err("locked: run `tv unlock --pin <PIN>` first".into());
    }
    Ok(())
}

fn unlock<S: SessionStore, C: Clock>(gate: &LockGate<S, C>, pin: &str) -> CliResult<()> {
    if !gate.has_pin()? {
        println!("No PIN configured.");
        return Ok(());
    }
    if !gate.verify_pin(pin)? {
        return Err("Incorrect PIN".into());
    }
    println!("Unlocked for 30 minutes.");
    Ok(())
}

fn pin_command<S: SessionStore, C: Clock>(
    gate: &LockGate<S, C>,
    command: PinCommands,
) -> CliResult<()> {
    match command {
        PinCommands::Set { pin, confirm } => {
            ensure_unlocked(gate)?;
            validate_new_pin(&pin, &confirm)?;
            gate.setup_pin(&pin)?;
            println!("PIN enabled successfully.");
        }
        PinCommands::Remove { pin } => {
            if !gate.has_pin()? {
                println!("No PIN configured.");
            } else if gate.remove_pin_verified(&pin)? {
                println!("PIN removed successfully.");
            } else {
                return Err("Incorrect PIN".into());
            }
        }
    }
    Ok(())
}

fn deliver_signal<S: SessionStore, C: Clock>(
    gate: &LockGate<S, C>,
    kind: SignalKind,
) -> CliResult<()> {
    let signal = match kind {
        SignalKind::Hidden => LockSignal::Hidden,
        SignalKind::Unloading => LockSignal::Unloading,
    };
    let relocked = Cell::new(false);
    let hub = SignalHub::new();
    let _subscription = auto_lock(&hub, gate, || relocked.set(true));
    hub.dispatch(signal);

    if relocked.get() {
        println!("Locked ({}).", signal.as_str());
    }
    Ok(())
}

fn task_command<R, C, S, G>(
    controller: &mut TaskController<R, C>,
    gate: &LockGate<S, G>,
    command: Commands,
) -> CliResult<()>
where
    R: TaskRepository,
    C: Clock,
    S: SessionStore,
    G: Clock,
{
    let now = SystemClock.now_ms();
    match command {
        Commands::Add { title, category } => {
            match controller.add_task(&title.join(" "), category.as_deref())? {
                Some(task) => println!("Added {} [{}]", task.id, task.category),
                None => println!("Nothing to add: title is empty."),
            }
        }
        Commands::List { category, archived } => {
            let source = if archived {
                controller.archived_tasks()
            } else {
                controller.tasks()
            };
            for task in source
                .iter()
                .filter(|task| category.as_deref().map_or(true, |id| task.category == id))
            {
                let (stamp, suffix) = match task.completed_at {
                    Some(at) if controller.can_undo(task) => (at, "  (undo available)"),
                    Some(at) => (at, ""),
                    None => (task.created_at, ""),
                };
                println!(
                    "{}  {}  [{}]  {}{}",
                    task.id,
                    task.title,
                    controller.category_label(&task.category),
                    relative_time(stamp, now),
                    suffix
                );
            }
        }
        Commands::Done { id } => {
            controller.complete_task(&id)?;
            println!("Completed {id}. Undo is available for one minute.");
        }
        Commands::Undo { id } => {
            controller.undo_complete(&id)?;
            println!("Restored {id}.");
        }
        Commands::Delete { id, yes } => {
            if !yes {
                return Err("refusing to delete without --yes".into());
            }
            controller.delete_task(&id)?;
            println!("Deleted {id}.");
        }
        Commands::Category { command } => match command {
            CategoryCommands::Add { name } => {
                let category = controller.add_category(&name.join(" "))?;
                println!("Added category {} ({}) {}", category.id, category.name, category.color);
            }
            CategoryCommands::List => {
                for category in controller.categories() {
                    println!("{}  {}  {}", category.id, category.name, category.color);
                }
            }
            CategoryCommands::Delete { id } => {
                controller.delete_category(&id)?;
                println!("Deleted category {id}.");
            }
        },
        Commands::Export { path } => {
            let path = path.unwrap_or_else(|| PathBuf::from(backup_file_name(now)));
            std::fs::write(&path, controller.export_data().to_json_pretty()?)?;
            info!("event=export module=cli status=ok");
            println!("Exported to {}.", path.display());
        }
        Commands::Import { path, yes } => {
            let body = std::fs::read_to_string(&path)?;
            let document = BackupDocument::from_json(&body)?;
            if !yes {
                return Err("import replaces all data; pass --yes to confirm".into());
            }
            controller.import_data(document)?;
            println!("Data imported successfully.");
        }
        Commands::Stats => {
            let stats = controller.stats();
            println!("Active tasks:   {}", stats.active);
            println!("Archived tasks: {}", stats.archived);
            println!("Categories:     {}", stats.categories);
            println!("Lock state:     {:?}", gate.state()?);
        }
        other => return Err(format!("{other:?} does not operate on tasks").into()),
    }
    Ok(())
}
