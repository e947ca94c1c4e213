//! services/api/src/bin/dashboard.rs
//!
//! Terminal front end for the report store. State is kept in a JSON file that
//! plays the role of browser local storage; summaries and drafts go through
//! the running API service.

use api_lib::{
    adapters::{http_client::DashboardApiClient, local_storage::FileStorage},
    config::Config,
    error::ApiError,
};
use clap::{Parser, Subcommand};
use report_dashboard_core::{
    domain::{NewReport, Report, Severity, UserRole},
    persistence::LocalPersistence,
    ports::Notifier,
    search::{debounce_lines, DEFAULT_SEARCH_DEBOUNCE},
    ActivityLog, ReportStore, ThemePreference, UserSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "dashboard", about = "Create, search, reorder and summarize reports")]
struct Cli {
    /// File holding the dashboard's local state.
    #[arg(long)]
    storage: Option<PathBuf>,
    /// Base URL of the API service.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List reports in display order, optionally filtered by title.
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        content: String,
    },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete {
        id: String,
    },
    /// Move a report into the slot currently held by another.
    Move {
        id: String,
        over: String,
    },
    Summarize {
        id: String,
    },
    /// Generate a draft report from a prompt.
    Draft {
        prompt: String,
    },
    /// Search as you type: one query per line, results shown once typing pauses.
    Search,
    /// Switch the current user's role.
    Role {
        role: UserRole,
    },
    /// Toggle between light and dark mode.
    Theme {
        /// Treat the system preference as dark when nothing is stored yet.
        #[arg(long)]
        system_dark: bool,
    },
    /// Show the activity log, newest first.
    Activity,
}

impl Command {
    fn requires_admin(&self) -> bool {
        matches!(
            self,
            Command::Add { .. }
                | Command::Edit { .. }
                | Command::Delete { .. }
                | Command::Summarize { .. }
                | Command::Draft { .. }
        )
    }
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        let label = match severity {
            Severity::Info => "info",
            Severity::Success => "ok",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        eprintln!("[{}] {}", label, message);
    }
}

fn print_report(report: &Report) {
    println!(
        "{}  {}  ({})",
        report.id,
        report.title,
        report.created_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(summary) = &report.summary {
        println!("    summary: {}", summary);
    }
}

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let storage_path = cli.storage.clone().unwrap_or(config.storage_path.clone());
    let api_url = cli.api_url.clone().unwrap_or(config.api_url.clone());

    let storage = Arc::new(FileStorage::open(storage_path)?);
    let persistence = LocalPersistence::new(storage, config.storage_keys.clone());
    let session = Arc::new(UserSession::load(persistence.clone())?);
    let activity = Arc::new(ActivityLog::load(persistence.clone(), session.clone())?);
    let client = Arc::new(DashboardApiClient::new(api_url));
    let store = ReportStore::new(
        persistence.clone(),
        client.clone(),
        Arc::new(ConsoleNotifier),
        activity.clone(),
    );

    if cli.command.requires_admin() && !session.can_edit() {
        return Err(ApiError::Internal(format!(
            "'{}' is a viewer; switch to the admin role first (dashboard role admin)",
            session.current().name
        )));
    }

    store.fetch()?;

    match cli.command {
        Command::List { search } => {
            let reports = match search.as_deref() {
                Some(query) => store.search(query),
                None => store.reports(),
            };
            if reports.is_empty() {
                println!("No reports found");
            }
            reports.iter().for_each(print_report);
        }
        Command::Search => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            debounce_lines(stdin, DEFAULT_SEARCH_DEBOUNCE, |query| {
                let reports = store.search(query);
                println!("-- {} match(es) for '{}'", reports.len(), query.trim());
                reports.iter().for_each(print_report);
            })
            .await?;
        }
        Command::Add { title, content } => {
            if title.trim().is_empty() {
                return Err(ApiError::Internal("Title must not be empty".to_string()));
            }
            let report = store.add(NewReport::new(title, content))?;
            print_report(&report);
        }
        Command::Edit { id, title, content } => {
            let mut report = store
                .get(&id)
                .ok_or_else(|| ApiError::Internal(format!("Report {} not found", id)))?;
            if let Some(title) = title {
                if title.trim().is_empty() {
                    return Err(ApiError::Internal("Title must not be empty".to_string()));
                }
                report.title = title;
            }
            if let Some(content) = content {
                report.content = content;
            }
            store.update(report.clone())?;
            print_report(&report);
        }
        Command::Delete { id } => {
            if store.delete(&id)? {
                println!("Deleted {}", id);
            } else {
                println!("No report with id {}", id);
            }
        }
        Command::Move { id, over } => {
            if store.move_report(&id, &over)? {
                store.reports().iter().for_each(print_report);
            } else {
                println!("Nothing to move");
            }
        }
        Command::Summarize { id } => {
            let summary = store.summarize(&id).await?;
            println!("{}", summary);
        }
        Command::Draft { prompt } => {
            let report = store.add_draft(client.as_ref(), &prompt).await?;
            print_report(&report);
        }
        Command::Role { role } => {
            let user = session.set_role(role)?;
            println!("{} is now {}", user.name, user.role);
        }
        Command::Theme { system_dark } => {
            let theme = ThemePreference::load(persistence, system_dark)?;
            println!("Theme: {}", theme.toggle()?.as_str());
        }
        Command::Activity => {
            for entry in activity.entries() {
                println!(
                    "{}  {:<9}  {}  {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    format!("{:?}", entry.kind).to_lowercase(),
                    entry.user_name,
                    entry.report_id.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}
