use crate::service::ingest::{IngestError, IngestJob, IngestSummary};
use crate::state::AppState;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Run every ingestion job on a fixed interval until `shutdown` fires.
///
/// The first tick fires immediately so a fresh process warms its caches.
pub async fn start_polling(state: Arc<AppState>, period: Duration, shutdown: CancellationToken) {
    info!("Starting ingestion polling every {:?}", period);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                run_all_jobs(&state).await;
            }
            _ = shutdown.cancelled() => {
                info!("Shutting down ingestion polling");
                break;
            }
        }
    }
}

/// One pass over all jobs; failures are logged and never stop the loop.
pub async fn run_all_jobs(state: &AppState) -> usize {
    let mut succeeded = 0;
    for job in IngestJob::all() {
        match run_with_retry(state, job).await {
            Ok(summary) => {
                debug!("Job {} finished: {}", job.name(), summary.message);
                succeeded += 1;
            }
            Err(e) => error!("Job {} gave up: {}", job.name(), e),
        }
    }
    info!("Ingestion pass complete: {} jobs succeeded", succeeded);
    succeeded
}

async fn run_with_retry(
    state: &AppState,
    job: IngestJob,
) -> Result<IngestSummary, IngestError> {
    (|| job.run(state))
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(2))
                .with_max_times(3),
        )
        .when(IngestError::is_transient)
        .notify(|e: &IngestError, wait: Duration| {
            warn!("Job {} failed, retrying in {:?}: {}", job.name(), wait, e);
        })
        .await
}
