//! The long-running loop that feeds uploads into the pipeline.

use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::PipelineResult;
use crate::types::CycleReport;

use super::batch::BatchScheduler;
use super::discovery::FileDiscovery;
use super::in_flight::InFlightSet;

/// Periodically scans the input directory and processes what it finds.
pub struct DirectoryPoller {
    scheduler: BatchScheduler,
    discovery: FileDiscovery,
    in_flight: InFlightSet,
    input_dir: PathBuf,
    interval: Duration,
}

impl DirectoryPoller {
    /// Build a poller over the scheduler's processor and input directory.
    pub fn new(config: &Config, scheduler: BatchScheduler) -> Self {
        let processor = scheduler.processor();
        Self {
            discovery: FileDiscovery::new(config.processing.clone()),
            in_flight: processor.in_flight().clone(),
            input_dir: processor.layout().raw_dir.clone(),
            interval: config.poll_interval(),
            scheduler,
        }
    }

    /// Override the sleep between cycles.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is observed at the top of each cycle and while sleeping.
    /// A batch that has already started is always awaited to completion. A
    /// failing cycle is logged and retried after the normal interval.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            "Photo processor started - monitoring {}",
            self.input_dir.display()
        );

        loop {
            if cancel.is_cancelled() {
                break;
            }

            if let Err(e) = self.poll_once().await {
                tracing::error!("Error in monitoring loop: {e}");
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Photo processor shutdown requested");
    }

    /// Run exactly one discovery + batch cycle.
    pub async fn poll_once(&self) -> PipelineResult<CycleReport> {
        let discovered = self.discovery.discover(&self.input_dir)?;
        let new_files: Vec<PathBuf> = discovered
            .iter()
            .filter(|f| !self.in_flight.contains(&f.file_name))
            .map(|f| f.path.clone())
            .collect();

        let mut report = CycleReport {
            discovered: discovered.len(),
            ..CycleReport::default()
        };
        if new_files.is_empty() {
            return Ok(report);
        }

        tracing::info!(
            "Monitoring {} - Found {} new files",
            self.input_dir.display(),
            new_files.len()
        );
        let results = self.scheduler.process_batch(&new_files).await;
        report.submitted = results.len();
        report.succeeded = results.iter().filter(|ok| **ok).count();
        report.failed = report.submitted - report.succeeded;
        Ok(report)
    }
}
