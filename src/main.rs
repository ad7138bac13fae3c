use std::{fmt::Display, path::PathBuf};

use clap::{Parser, Subcommand};
use colored::*;
use jiff::{
    Timestamp, Zoned,
    civil::{Date, DateTime},
};
use log::{info, warn};

use restart::{
    host::{CssStylesheet, DirectoryExport, FileSource},
    models::{settings::Theme, store::Store, task::TaskPatch},
    services::{
        backup::{
            create_quick_backup, export_user_data, factory_reset, get_backup_info,
            import_user_data, restore_quick_backup,
        },
        settings::set_theme,
        tasks::{
            AddTaskParameters, add_task, clear_completed_tasks, completed_tasks, delete_task,
            list_tasks, resolve_task_id, toggle_task, update_task,
        },
    },
    storage::json::JsonFileStorage,
    ui,
};

#[derive(Parser)]
#[command(
    name = "restart",
    about = "Tasks, theme and backups for the re-start new tab page"
)]
struct Cli {
    /// Directory holding settings, tasks and the generated theme.css
    #[arg(long, env = "RESTART_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title
        title: String,

        /// Due date, e.g. "2026-03-01", "2026-03-01T14:30", "today", "tomorrow"
        #[arg(short, long)]
        due: Option<String>,

        /// Add notes
        #[arg(short, long)]
        notes: Option<String>,
    },

    /// List open tasks
    List {
        /// Include completed tasks
        #[arg(short, long)]
        all: bool,
    },

    /// List completed tasks
    Completed,

    /// Edit a task
    Edit {
        /// Task id or a unique prefix of it
        task: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New notes
        #[arg(short, long)]
        notes: Option<String>,

        /// New due date
        #[arg(short, long, conflicts_with = "no_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        no_due: bool,
    },

    /// Toggle a task between open and done
    Done { task: String },

    /// Delete a task
    Rm { task: String },

    /// Delete every completed task
    Clear,

    /// Show or change the theme
    Theme {
        /// One of catppuccin-mocha, dark, light, custom
        name: Option<String>,
    },

    /// Export settings and tasks to a JSON backup file
    Export {
        /// Directory to write the backup into
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Import a JSON backup file
    Import { file: PathBuf },

    /// Take a quick backup of the current state
    Backup,

    /// Restore the last quick backup
    Restore,

    /// Wipe all stored data and start from defaults
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Show a summary of the stored data
    Info,
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("re-start")
    })
}

fn fail(error: impl Display) -> ! {
    eprintln!("{} {}", "Error:".red(), error);
    std::process::exit(1);
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid due date '{0}'. Use YYYY-MM-DD, YYYY-MM-DDTHH:MM, today or tomorrow")]
struct InvalidDueDate(String);

/// Parses a due date given on the command line, in local time unless an offset is given
fn parse_due(input: &str, now: &Zoned) -> Result<Timestamp, InvalidDueDate> {
    let invalid = || InvalidDueDate(input.to_string());
    let tz = now.time_zone().clone();

    let date = match input.trim().to_lowercase().as_str() {
        "today" => Some(now.date()),
        "tomorrow" | "tmrw" => Some(now.date().tomorrow().map_err(|_| invalid())?),
        _ => None,
    };
    if let Some(date) = date {
        return date
            .at(0, 0, 0, 0)
            .to_zoned(tz)
            .map(|zoned| zoned.timestamp())
            .map_err(|_| invalid());
    }

    if let Ok(timestamp) = input.parse::<Timestamp>() {
        return Ok(timestamp);
    }
    if let Ok(datetime) = input.parse::<DateTime>() {
        return datetime
            .to_zoned(tz)
            .map(|zoned| zoned.timestamp())
            .map_err(|_| invalid());
    }
    input
        .parse::<Date>()
        .map_err(|_| invalid())?
        .at(0, 0, 0, 0)
        .to_zoned(tz)
        .map(|zoned| zoned.timestamp())
        .map_err(|_| invalid())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let data_dir = resolve_data_dir(cli.data_dir);
    info!("using data directory {}", data_dir.display());

    let storage = JsonFileStorage::new(data_dir.clone());
    let mut store = Store::load(&storage);
    let mut stylesheet =
        CssStylesheet::with_active_theme(data_dir.join("theme.css"), &store.settings);
    let now = Zoned::now();

    match cli.command {
        None | Some(Commands::List { all: false }) => {
            let tasks = list_tasks(&store, false);
            if tasks.is_empty() {
                println!("No open tasks");
            } else {
                ui::render_view_header("Tasks", tasks.len());
                for task in tasks {
                    ui::render_task_line(task, &now, &store.settings);
                }
            }
        }
        Some(Commands::List { all: true }) => {
            let tasks = list_tasks(&store, true);
            if tasks.is_empty() {
                println!("No tasks");
            } else {
                ui::render_view_header("All tasks", tasks.len());
                let mut in_completed = false;
                for task in tasks {
                    if task.completed && !in_completed {
                        ui::render_section_header("Completed");
                        in_completed = true;
                    }
                    ui::render_task_line(task, &now, &store.settings);
                }
            }
        }
        Some(Commands::Completed) => {
            let tasks = completed_tasks(&store);
            if tasks.is_empty() {
                println!("No completed tasks");
            } else {
                ui::render_view_header("Completed", tasks.len());
                for task in tasks {
                    ui::render_task_line(task, &now, &store.settings);
                }
            }
        }
        Some(Commands::Add { title, due, notes }) => {
            let due = due
                .map(|due| parse_due(&due, &now))
                .transpose()
                .unwrap_or_else(|e| fail(e));
            match add_task(&mut store, &storage, AddTaskParameters { title, due, notes }) {
                Ok(task) => println!(
                    "{} Added {} {}",
                    "✓".green(),
                    task.short_id().dimmed(),
                    task.title.bold()
                ),
                Err(e) => fail(e),
            }
        }
        Some(Commands::Edit {
            task,
            title,
            notes,
            due,
            no_due,
        }) => {
            let id = resolve_task_id(&store, &task).unwrap_or_else(|e| fail(e));
            let due = if no_due {
                Some(None)
            } else {
                due.map(|due| parse_due(&due, &now).map(Some))
                    .transpose()
                    .unwrap_or_else(|e| fail(e))
            };
            let patch = TaskPatch {
                title,
                notes,
                due,
                ..TaskPatch::default()
            };
            match update_task(&mut store, &storage, id, patch) {
                Ok(Some(task)) => println!("{} Updated {}", "✓".green(), task.title.bold()),
                Ok(None) => fail(format!("Task '{task}' not found")),
                Err(e) => fail(e),
            }
        }
        Some(Commands::Done { task }) => {
            let id = resolve_task_id(&store, &task).unwrap_or_else(|e| fail(e));
            match toggle_task(&mut store, &storage, id) {
                Ok(Some(task)) if task.completed => {
                    println!("{} Completed {}", "✓".green(), task.title.bold())
                }
                Ok(Some(task)) => println!("{} Reopened {}", "○".normal(), task.title.bold()),
                Ok(None) => fail(format!("Task '{task}' not found")),
                Err(e) => fail(e),
            }
        }
        Some(Commands::Rm { task }) => {
            let id = resolve_task_id(&store, &task).unwrap_or_else(|e| fail(e));
            if delete_task(&mut store, &storage, id) {
                println!("{} Deleted task", "✓".green());
            } else {
                fail(format!("Task '{task}' not found"));
            }
        }
        Some(Commands::Clear) => {
            let removed = clear_completed_tasks(&mut store, &storage);
            println!("{} Cleared {} completed tasks", "✓".green(), removed);
        }
        Some(Commands::Theme { name: None }) => {
            println!("{}", store.settings.theme);
        }
        Some(Commands::Theme { name: Some(name) }) => {
            let theme: Theme = name.parse().unwrap_or_else(|e| fail(e));
            set_theme(&mut store, &storage, &mut stylesheet, theme);
            println!("{} Theme set to {}", "✓".green(), theme.to_string().cyan());
        }
        Some(Commands::Export { out }) => {
            let mut target = DirectoryExport::new(out);
            match export_user_data(&store, &mut target) {
                Ok(backup) => {
                    let path = target
                        .last_written()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    println!(
                        "{} Exported {} tasks to {}",
                        "✓".green(),
                        backup.tasks.len(),
                        path.cyan()
                    );
                }
                Err(e) => fail(e),
            }
        }
        Some(Commands::Import { file }) => {
            let mut source = FileSource::new(file);
            match import_user_data(&mut store, &storage, &mut stylesheet, &mut source) {
                Ok(report) => {
                    println!("{} {}", "✓".green(), report.message);
                    println!(
                        "  settings: {}  tasks: {}  theme: {}",
                        if report.items_imported.settings { "yes" } else { "no" },
                        report.items_imported.tasks,
                        report.items_imported.theme.cyan()
                    );
                }
                Err(e) => fail(e),
            }
        }
        Some(Commands::Backup) => {
            let backup = create_quick_backup(&store, &storage);
            println!(
                "{} Quick backup taken ({} tasks)",
                "✓".green(),
                backup.tasks.len()
            );
        }
        Some(Commands::Restore) => {
            if restore_quick_backup(&mut store, &storage, &mut stylesheet) {
                println!("{} Restored quick backup", "✓".green());
            } else {
                fail("No usable quick backup found. Nothing was changed");
            }
        }
        Some(Commands::Reset { yes: false }) => {
            fail("This deletes everything in the data directory. Re-run with --yes to confirm");
        }
        Some(Commands::Reset { yes: true }) => {
            match factory_reset(&mut store, &storage, &mut stylesheet) {
                Ok(backup) => println!(
                    "{} Reset to defaults ({} tasks removed)",
                    "✓".green(),
                    backup.tasks.len()
                ),
                Err(e) => fail(e),
            }
        }
        Some(Commands::Info) => {
            ui::render_backup_info(&get_backup_info(&store));
        }
    }

    if stylesheet.is_dirty()
        && let Err(e) = stylesheet.write()
    {
        warn!(
            "failed to write stylesheet {}: {}",
            stylesheet.path().display(),
            e
        );
    }
}
