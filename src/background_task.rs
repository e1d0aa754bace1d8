use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::time::{interval, Duration};

use crate::repositories::contact::ContactRepository;

const ARCHIVE_INTERVAL: Duration = Duration::from_secs(60 * 60 * 24);

/// Archives resolved and closed contact messages older than `after_days`,
/// once a day.
pub async fn start_archive_task(repo: Arc<dyn ContactRepository>, after_days: i64) {
    let mut interval = interval(ARCHIVE_INTERVAL);

    loop {
        interval.tick().await;

        let cutoff = Utc::now() - ChronoDuration::days(after_days);
        match repo.archive_stale(cutoff).await {
            Ok(count) => tracing::info!(count, after_days, "Archived stale contact messages"),
            Err(e) => tracing::error!(error = %e, "Contact archive task failed"),
        }
    }
}
