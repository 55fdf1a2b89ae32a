use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use domain::services::{JobSettings, RetryPolicy, SnapshotJob, SnapshotStore};
use tracing::info;
use visitor_monitor_scheduler::config::Config;
use visitor_monitor_scheduler::jobs::{JobScheduler, SnapshotAnalysisJob, SnapshotCaptureJob};
use visitor_monitor_scheduler::logging::init_logging;
use visitor_monitor_scheduler::services::{BlobStoreService, CompletionService, EmailService};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    init_logging(&config.logging);

    info!("Starting Visitor Monitor v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&config.database.to_pool_config()).await?;

    // Wire up the pipeline collaborators
    let rows = Arc::new(persistence::repositories::VisitorLogRepository::new(
        pool,
        config.jobs.top_n,
    ));
    let snapshots: Arc<dyn SnapshotStore> = Arc::new(BlobStoreService::new(
        &config.storage,
        &config.storage.results_container,
    ));
    let status: Option<Arc<dyn SnapshotStore>> = if config.jobs.write_status_blobs {
        Some(Arc::new(BlobStoreService::new(
            &config.storage,
            &config.storage.status_container,
        )))
    } else {
        None
    };
    let engine = Arc::new(CompletionService::new(&config.narrative));
    let notifier = Arc::new(EmailService::new(config.email.clone()));

    let settings = JobSettings {
        recipient: config.email.recipient.clone(),
        retry: RetryPolicy {
            max_attempts: config.jobs.capture_max_attempts,
            backoff: Duration::from_secs(config.jobs.capture_backoff_secs),
        },
        max_narrative_tokens: Some(config.narrative.max_tokens),
        include_status_in_email: config.jobs.include_status_in_email,
    };

    let pipeline = Arc::new(SnapshotJob::new(
        rows, snapshots, status, engine, notifier, settings,
    ));

    // Schedule the two daily phases
    let mut scheduler = JobScheduler::new();
    scheduler.register(SnapshotCaptureJob::new(
        Arc::clone(&pipeline),
        config.jobs.capture_hour_utc,
    ));
    scheduler.register(SnapshotAnalysisJob::new(
        pipeline,
        config.jobs.analysis_hour_utc,
        config.jobs.lookback_days,
    ));
    scheduler.start();

    info!(
        capture_hour_utc = config.jobs.capture_hour_utc,
        analysis_hour_utc = config.jobs.analysis_hour_utc,
        "Scheduler running, waiting for shutdown signal"
    );

    tokio::signal::ctrl_c().await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;

    Ok(())
}
