//! Kidbank recurring deposit scheduler.
//!
//! One-shot batch runner intended to be invoked once per day (cron or a
//! container scheduler). Processes every active recurring deposit rule due
//! today inside a single database transaction.

use chrono::Utc;
use sea_orm::TransactionTrait;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kidbank_core::ServiceContext;
use kidbank_db::{connect, SeaOrmStore};
use kidbank_shared::{AppConfig, SmtpMailer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kidbank=debug,scheduler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database).await?;
    info!("Connected to database");

    let mailer = SmtpMailer::new(config.mail.clone());

    // The whole batch commits or rolls back as one unit; per-rule failures
    // are recorded in the audit trail, not raised.
    let txn = db.begin().await?;
    let store = SeaOrmStore::new(&txn);
    let ctx = ServiceContext::from_store(&store, &mailer, &config.invite.frontend_url);

    let now = Utc::now();
    let summary = ctx.scheduler().process_day(now).await?;
    txn.commit().await?;

    info!(
        date = %now.date_naive(),
        processed = summary.processed,
        succeeded = summary.succeeded,
        skipped = summary.skipped,
        failed = summary.failed,
        "Recurring deposit batch complete"
    );

    Ok(())
}
