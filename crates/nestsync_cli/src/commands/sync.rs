use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use uuid::Uuid;

use nestsync::db;
use nestsync::provider::{ApiRateLimiter, HomeScopeClient, ProviderAdapter, RateLimitedProvider};
use nestsync::sync::{CollectionSyncResult, Scheduler, SkipReason, SyncEngine, TickSummary};
use nestsync::transport::reqwest_transport::ReqwestTransport;

use crate::config::Config;
use crate::{SyncAction, shutdown};

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) async fn handle_sync(
    action: SyncAction,
    config: &Config,
    database_url: &str,
) -> anyhow::Result<()> {
    match action {
        SyncAction::Tick {
            batch_size,
            workers,
        } => {
            let options = config.sync_options(batch_size, workers, None);
            let engine = build_engine(config, database_url, options.provider_rps).await?;
            let scheduler = Scheduler::new(engine, options);

            let summary = scheduler.tick().await?;
            print_summary(&summary);
        }
        SyncAction::Collection { id } => {
            let engine =
                build_engine(config, database_url, config.provider.requests_per_second).await?;
            refresh_one(&engine, id).await?;
        }
        SyncAction::Schedule {
            batch_size,
            workers,
            interval_secs,
        } => {
            let options = config.sync_options(batch_size, workers, interval_secs);
            let engine = build_engine(config, database_url, options.provider_rps).await?;
            let scheduler = Scheduler::new(engine, options);

            shutdown::setup_shutdown_handler(scheduler.shutdown_handle());
            scheduler.run().await;
        }
    }

    Ok(())
}

async fn build_engine(
    config: &Config,
    database_url: &str,
    provider_rps: u32,
) -> anyhow::Result<Arc<SyncEngine>> {
    let api_key = config
        .provider
        .api_key
        .clone()
        .context("provider API key not configured (set NESTSYNC_PROVIDER_API_KEY)")?;

    let db = db::connect(database_url).await?;

    let transport = ReqwestTransport::with_timeout(PROVIDER_TIMEOUT)
        .map_err(|e| anyhow::anyhow!("failed to build HTTP transport: {e}"))?;
    let client = HomeScopeClient::new(transport, api_key, config.provider.base_url.clone())
        .map_err(|e| anyhow::anyhow!("invalid provider configuration: {e}"))?;
    let limited = RateLimitedProvider::new(client, ApiRateLimiter::new(provider_rps));
    let adapter = Arc::new(ProviderAdapter::new(Arc::new(limited)));

    Ok(Arc::new(SyncEngine::new(db, adapter)))
}

async fn refresh_one(engine: &SyncEngine, collection_id: Uuid) -> anyhow::Result<()> {
    println!("Syncing collection {collection_id}...");

    match engine.sync_by_id(collection_id).await? {
        CollectionSyncResult::Completed(report) => {
            println!(
                "Done: {} added, {} unavailable, {} reactivated, {} active{}",
                report.added,
                report.marked_unavailable,
                report.reactivated,
                report.total_active,
                if report.degraded {
                    " (some filters were not applied)"
                } else {
                    ""
                }
            );
        }
        CollectionSyncResult::Skipped(SkipReason::InFlight) => {
            println!("Skipped: a sync for this collection is already running.");
        }
        CollectionSyncResult::Skipped(SkipReason::NotSchedulable) => {
            println!("Skipped: collection is inactive.");
        }
    }

    Ok(())
}

fn print_summary(summary: &TickSummary) {
    println!(
        "Tick finished: {} due, {} completed, {} skipped, {} failed, {} stale details swept",
        summary.attempted,
        summary.completed,
        summary.skipped,
        summary.failed,
        summary.details_swept
    );
}
