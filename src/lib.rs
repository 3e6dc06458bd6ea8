pub mod config;
pub mod db;
pub mod family;
pub mod ledger;
pub mod medications;
pub mod models;
pub mod reminders;
pub mod schedule;
pub mod settings;
pub mod terminal;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use reminders::{DelayedReminderScheduler, ReminderDispatcher, ReminderSession};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] db::StorageError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Open the local store and run the reminder session on the terminal
/// until Ctrl-C or `sair`.
pub fn run() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let db_path = config::database_path();
    let conn = db::open_database(&db_path)?;
    let settings = settings::load_settings(&conn)?;
    tracing::info!(
        path = %db_path.display(),
        reminder_interval_minutes = settings.reminder_interval_minutes,
        "Database ready"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (dispatcher, snoozed) =
            ReminderDispatcher::new(terminal::console_capabilities(), DelayedReminderScheduler::new());
        let session = ReminderSession::new(conn, dispatcher, snoozed);

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(terminal::read_commands(command_tx));
        let printer = tokio::spawn(terminal::print_events(event_rx));

        println!("{}\n{}", config::APP_NAME, terminal::HELP);
        session.run(command_rx, event_tx, shutdown_signal()).await;
        join_logged("event printer", printer).await;
    });

    // stdin is read on a blocking thread that never returns on its own.
    runtime.shutdown_timeout(Duration::from_millis(200));
    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}

/// Wait for a background task, logging a panic or cancellation.
async fn join_logged(name: &str, task: tokio::task::JoinHandle<()>) -> bool {
    match task.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(task = name, error = %e, "Background task failed");
            false
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}
