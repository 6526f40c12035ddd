//! Command-line front-end for the to-do core.
//!
//! # Responsibility
//! - Resolve config, data and log locations for the current user.
//! - Run the first-run import before serving a command.
//! - Render tasks as plain text; all state lives in `todo_core`.

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use log::{info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use todo_core::db::open_db;
use todo_core::{
    default_log_level, init_logging, CoreConfig, HttpRemoteSource, ImportConfig, ImportGate,
    ImportOutcome, SortOrder, SqliteImportFlag, SqliteTaskRepository, Task, TaskId, TaskStore,
};

const DB_FILE_NAME: &str = "todo.sqlite3";

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "A small to-do list backed by SQLite.")]
struct Cli {
    /// Config file (defaults to the platform config dir, or $TODO_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all tasks
    List {
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    /// Add a task
    Add {
        name: String,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Replace a task's name and description
    Edit {
        id: TaskId,
        name: String,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Flip a task between open and done
    Toggle { id: TaskId },
    /// Delete a task
    Delete { id: TaskId },
    /// Search names and descriptions, ignoring case
    Search { query: String },
    /// Print the share text of a task
    Share { id: TaskId },
    /// Run the first-run import now and report the outcome
    Import,
    /// Print the number of tasks
    Count,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SortArg {
    Oldest,
    Newest,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Oldest => SortOrder::Oldest,
            SortArg::Newest => SortOrder::Newest,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = CoreConfig::load(&config_path)?;
    let data_dir = default_data_dir();

    let log_dir = config
        .logging
        .dir
        .clone()
        .unwrap_or_else(|| data_dir.join("logs"));
    let level = config
        .logging
        .level
        .as_deref()
        .unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, &log_dir) {
        eprintln!("warning: file logging disabled: {err}");
    }

    let db_path = config
        .storage
        .db_path
        .clone()
        .unwrap_or_else(|| data_dir.join(DB_FILE_NAME));
    let conn = open_db(&db_path)?;
    let mut store = TaskStore::load(SqliteTaskRepository::new(&conn))?;

    let explicit_import = matches!(cli.command, Command::Import);
    if config.import.enabled || explicit_import {
        let outcome = run_import(&conn, &mut store, &config.import);
        if explicit_import {
            report_import(outcome);
            return Ok(());
        }
    }

    match cli.command {
        Command::List { sort } => {
            let tasks = match sort {
                Some(sort) => store.list_sorted(sort.into()),
                None => store.list(),
            };
            print_tasks(&tasks);
        }
        Command::Add { name, description } => {
            let task = store.create(name, description, None, None)?;
            println!("{}", task.id);
        }
        Command::Edit {
            id,
            name,
            description,
        } => {
            let task = store.edit(id, name, description)?;
            print_tasks(&[task]);
        }
        Command::Toggle { id } => {
            let task = store.toggle_completed(id)?;
            print_tasks(&[task]);
        }
        Command::Delete { id } => store.delete(id)?,
        Command::Search { query } => print_tasks(&store.search(&query)),
        Command::Share { id } => {
            let task = store
                .get(id)
                .ok_or_else(|| format!("task not found: {id}"))?;
            println!("{}", task.share_text());
        }
        Command::Count => println!("{}", store.count()),
        Command::Import => {}
    }

    Ok(())
}

/// Runs the import gate to completion. Failures are logged, never fatal.
fn run_import(
    conn: &Connection,
    store: &mut TaskStore<SqliteTaskRepository<'_>>,
    import: &ImportConfig,
) -> Option<ImportOutcome> {
    let source = match HttpRemoteSource::new(import.url.as_str(), import.timeout()) {
        Ok(source) => source,
        Err(err) => {
            warn!("event=import_activate module=cli status=error error={err}");
            return None;
        }
    };

    info!(
        "event=import_activate module=cli status=start url={}",
        source.url()
    );
    let mut gate = ImportGate::new(SqliteImportFlag::new(conn), Arc::new(source));
    match gate.run_blocking(store) {
        Ok(outcome) => outcome,
        Err(err) => Some(ImportOutcome::Failed(err)),
    }
}

fn report_import(outcome: Option<ImportOutcome>) {
    match outcome {
        None => println!("already imported"),
        Some(ImportOutcome::Imported { created, skipped }) => {
            println!("imported {created} tasks ({skipped} skipped)");
        }
        Some(ImportOutcome::Failed(err)) => {
            println!("import failed, will retry on next launch: {err}");
        }
    }
}

fn print_tasks(tasks: &[Task]) {
    for task in tasks {
        let mark = if task.is_completed { "x" } else { " " };
        println!("[{mark}] {}  {}  {}", task.name, task.display_date(), task.id);
        if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
            println!("      {description}");
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "todo")
}

fn default_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("TODO_DATA_DIR") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.data_dir().to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".todo")
}

fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os("TODO_CONFIG") {
        return PathBuf::from(path);
    }
    if let Some(dirs) = project_dirs() {
        return dirs.config_dir().join("config.toml");
    }
    default_data_dir().join("config.toml")
}
