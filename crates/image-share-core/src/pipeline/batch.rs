//! Bounded fan-out of a batch of uploads to the single-item processor.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::future::join_all;

use super::processor::PhotoProcessor;

/// Runs up to `max_concurrent` processing attempts at once.
#[derive(Clone)]
pub struct BatchScheduler {
    processor: Arc<PhotoProcessor>,
    max_concurrent: usize,
}

impl BatchScheduler {
    pub fn new(processor: Arc<PhotoProcessor>, max_concurrent: usize) -> Self {
        Self {
            processor,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn processor(&self) -> &Arc<PhotoProcessor> {
        &self.processor
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Process the head of `items` concurrently.
    ///
    /// Only the first `max_concurrent` items are admitted; the rest are left
    /// in place for a later cycle. Results follow input order. A task that
    /// panics or is cancelled counts as `false`; this call never fails.
    pub async fn process_batch(&self, items: &[PathBuf]) -> Vec<bool> {
        let admitted = &items[..items.len().min(self.max_concurrent)];
        if admitted.len() < items.len() {
            tracing::debug!(
                "Admitting {} of {} images this cycle",
                admitted.len(),
                items.len()
            );
        }

        let handles: Vec<_> = admitted
            .iter()
            .cloned()
            .map(|path| {
                let processor = Arc::clone(&self.processor);
                tokio::spawn(async move { processor.process(&path).await })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(admitted)
            .map(|(joined, path)| match joined {
                Ok(success) => success,
                Err(e) => {
                    tracing::error!("Processing task for {} aborted: {e}", path.display());
                    false
                }
            })
            .collect()
    }
}
