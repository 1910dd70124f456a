//! Taskdeck -- personal task tracker CLI.
//!
//! Runs one command against a `taskdeck-server`, then prints the sorted list
//! and the outcome. Configuration via CLI flags, environment variables, or
//! config file (`~/.config/taskdeck/config.toml`).
//!
//! ```bash
//! # Show the list
//! cargo run --bin taskdeck -- --token secret
//!
//! # Add a task, then complete it
//! cargo run --bin taskdeck -- add "Buy milk" --priority high --due 2024-01-01
//! cargo run --bin taskdeck -- done 1
//!
//! # Or via environment variables
//! TASKDECK_URL=http://127.0.0.1:3000 TASKDECK_TOKEN=secret cargo run --bin taskdeck -- list
//! ```

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use taskdeck::config::{CliArgs, ClientConfig, Command};
use taskdeck::tasks::{
    Notification, NotificationKind, SortState, TaskController, TaskError, completion_summary,
};
use taskdeck::transport::TaskApi;
use taskdeck_proto::api::CreateTaskRequest;
use taskdeck_proto::task::{Task, TodoStatus};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::debug!(server = %config.server_url, "taskdeck starting");

    let (controller, mut notifications) = TaskController::new(config.transport());
    if let Err(e) = controller.load().await {
        eprintln!("Error: could not load tasks: {e}");
        return ExitCode::FAILURE;
    }

    let command = cli.command.unwrap_or(Command::List);
    let result = run_command(&controller, command).await;

    print_tasks(&controller.cache().snapshot(), config.sort);
    print_notifications(&mut notifications);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging.
///
/// Logs go to stderr unless a file is given, in which case they are written
/// through a non-blocking appender. The returned [`WorkerGuard`] must be held
/// until shutdown so buffered entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let Some(log_path) = file_path else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(env_filter)
            .init();
        return None;
    };

    let log_dir = log_path.parent().filter(|p| !p.as_os_str().is_empty());
    let file_name = log_path.file_name()?;

    let file_appender =
        tracing_appender::rolling::never(log_dir.unwrap_or_else(|| Path::new(".")), file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

async fn run_command<A: TaskApi>(
    controller: &TaskController<A>,
    command: Command,
) -> Result<(), TaskError> {
    match command {
        Command::List => Ok(()),
        Command::Add {
            title,
            description,
            due,
            priority,
            tags,
            completed,
        } => {
            let mut request = CreateTaskRequest::new(title);
            if let Some(description) = description {
                request = request.with_description(description);
            }
            if let Some(due) = due {
                request = request.with_due_date(due);
            }
            if let Some(priority) = priority {
                request = request.with_priority(priority);
            }
            if !tags.is_empty() {
                request = request.with_tags(tags);
            }
            if completed {
                request = request.with_status(TodoStatus::Completed);
            }
            controller.create(request).await.map(|_| ())
        }
        Command::Done { id } => controller
            .update_status(id, TodoStatus::Completed)
            .await
            .map(|_| ()),
        Command::Reopen { id } => controller
            .update_status(id, TodoStatus::Pending)
            .await
            .map(|_| ()),
        Command::Toggle { id } => controller.toggle_status(id).await.map(|_| ()),
        Command::Rm { id } => controller.delete(id).await.map(|_| ()),
    }
}

fn print_tasks(tasks: &[Task], sort: SortState) {
    let (completed, total) = completion_summary(tasks);
    println!(
        "{completed} of {total} tasks completed (sorted by {} {})",
        sort.key(),
        sort.direction()
    );

    for task in sort.derive(tasks) {
        let check = if task.is_completed() { "x" } else { " " };
        let mut line = format!("[{check}] {:>4}  {}", task.id, task.title);
        if let Some(priority) = task.priority {
            line.push_str(&format!("  !{priority}"));
        }
        if let Some(due) = task.due_date {
            line.push_str(&format!("  due {}", due.format("%Y-%m-%d")));
        }
        if !task.tags.is_empty() {
            line.push_str(&format!("  #{}", task.tags.join(" #")));
        }
        println!("{line}");
        if let Some(description) = task.description.as_deref().filter(|d| !d.is_empty()) {
            println!("            {description}");
        }
    }
}

fn print_notifications(notifications: &mut mpsc::UnboundedReceiver<Notification>) {
    while let Ok(note) = notifications.try_recv() {
        match note.kind {
            NotificationKind::Success => println!("{}", note.message),
            NotificationKind::Error => eprintln!("Error: {}", note.message),
        }
    }
}
