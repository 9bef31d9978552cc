//! Operator CLI over the alert engine.
//!
//! # Responsibility
//! - Open a record store database and run engine operations against it.
//! - Print alerts as an aligned table or JSON.
//!
//! Dismissals only live for one invocation, same as any engine instance.

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use crm_alerts_core::{
    default_log_level, init_logging, Activity, Alert, AlertService, Contact, EngineConfig,
    RecordId, RecordRef, SqliteRecordStore, SystemClock, Task, DEFAULT_FOLLOW_UP_WINDOW_DAYS,
};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "crm-alerts", version, about = "Derive CRM follow-up and task alerts")]
struct Cli {
    /// Record store database file.
    #[arg(long, env = "CRM_ALERTS_DB")]
    db: PathBuf,

    /// Absolute directory for rolling log files. Logging is off when unset.
    #[arg(long, env = "CRM_ALERTS_LOG_DIR")]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "CRM_ALERTS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Trailing window, in days, for follow-up alerts.
    #[arg(long, default_value_t = DEFAULT_FOLLOW_UP_WINDOW_DAYS)]
    follow_up_days: u32,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Derive and print the ranked alert list
    List {
        /// Alert ids to dismiss before printing
        #[arg(long = "dismiss")]
        dismiss: Vec<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Mark a task completed and print the remaining alerts
    Complete {
        task_id: RecordId,
        #[arg(long)]
        json: bool,
    },

    /// Insert a small demo dataset relative to the current time
    SeedDemo,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(source) = err.source() {
                eprintln!("caused by: {source}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let store = SqliteRecordStore::open(&cli.db)?;
    let config = EngineConfig {
        follow_up_window_days: cli.follow_up_days,
    };
    let service = AlertService::with_config(store, SystemClock, config)?;

    match cli.cmd {
        Command::List { dismiss, json } => {
            for alert_id in &dismiss {
                service.dismiss_alert(alert_id);
            }
            print_alerts(&service.get_all()?, json)?;
        }
        Command::Complete { task_id, json } => {
            service.complete_task(task_id)?;
            print_alerts(&service.get_all()?, json)?;
        }
        Command::SeedDemo => {
            let inserted = seed_demo(service.store())?;
            info!("event=seed_demo module=cli status=ok records={inserted}");
            println!("Inserted {inserted} demo records into {}", cli.db.display());
        }
    }
    Ok(())
}

fn print_alerts(alerts: &[Alert], json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(alerts)?);
        return Ok(());
    }
    if alerts.is_empty() {
        println!("No alerts.");
        return Ok(());
    }
    for alert in alerts {
        println!(
            "{:<6} {:<20} {}: {}",
            alert.priority.as_str(),
            alert.id,
            alert.title,
            alert.message
        );
    }
    Ok(())
}

fn seed_demo(store: &SqliteRecordStore) -> Result<usize, Box<dyn Error>> {
    let now = Utc::now();
    let contacts = [
        Contact::new(1, "Ada Lovelace"),
        Contact::new(2, "Grace Hopper"),
    ];
    let tasks = [
        Task::new(1, "Send proposal", now - Duration::days(2)),
        Task::new(2, "Prepare demo", now + Duration::hours(1)),
        Task::new(3, "Renewal call", now + Duration::days(1)),
    ];
    let activities = [
        (1, "call", 1, Duration::hours(5)),
        (2, "email", 1, Duration::days(2)),
        (3, "meeting", 2, Duration::days(4)),
    ];

    for contact in &contacts {
        store.insert_contact(contact)?;
    }
    for task in &tasks {
        let mut task = task.clone();
        task.contact_id = Some(RecordRef::Id(1));
        store.insert_task(&task)?;
    }
    for (id, kind, contact_id, age) in activities {
        let mut activity = Activity::new(id, kind, now - age);
        activity.contact_id = Some(RecordRef::Id(contact_id));
        store.insert_activity(&activity)?;
    }

    Ok(contacts.len() + tasks.len() + activities.len())
}
