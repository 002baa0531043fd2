//! Background service starters -- the job registry sweeper.

use std::time::Duration;

use super::AlbumDownloader;

impl AlbumDownloader {
    /// Start the registry sweeper background task.
    ///
    /// Periodically evicts finished jobs older than the configured TTL,
    /// deleting their undelivered artifacts, so abandoned polls do not leak
    /// entries and temp files forever. The task runs for the life of the
    /// process; shutdown does not need to join it.
    pub fn start_job_sweeper(&self) -> tokio::task::JoinHandle<()> {
        let registry = self.registry.clone();
        let ttl = Duration::from_secs(self.config.jobs.job_ttl_secs);
        let interval = Duration::from_secs(self.config.jobs.sweep_interval_secs);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh start
            // does not race newly submitted jobs.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = registry.sweep_expired(ttl).await;
                if removed > 0 {
                    tracing::info!(removed, "Registry sweep evicted expired jobs");
                }
            }
        });

        tracing::info!(
            ttl_secs = ttl.as_secs(),
            interval_secs = interval.as_secs(),
            "Job sweeper background task started"
        );

        handle
    }
}
