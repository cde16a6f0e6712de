//! Debounced, cancellable buildable-area previews.
//!
//! At most one preview is in flight. Scheduling a new one aborts the previous
//! task and bumps the generation counter, so a result that still slips through
//! is recognised as stale and dropped.

use std::sync::Arc;
use std::time::Duration;

use siteinspect_core::error::Result;
use siteinspect_core::models::{BuildableArea, BuildableAreaRequest};
use siteinspect_core::ports::BuildableAreaService;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::setback::normalize_response;

/// Default delay between the last input change and the preview request
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Result of one preview request
#[derive(Debug)]
pub struct PreviewOutcome {
    pub generation: u64,
    pub result: Result<BuildableArea>,
}

pub struct PreviewScheduler {
    debounce: Duration,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    results_tx: mpsc::UnboundedSender<PreviewOutcome>,
    results_rx: mpsc::UnboundedReceiver<PreviewOutcome>,
}

impl Default for PreviewScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl PreviewScheduler {
    pub fn new(debounce: Duration) -> Self {
        let (results_tx, results_rx) = mpsc::unbounded_channel();
        Self { debounce, generation: 0, in_flight: None, results_tx, results_rx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Schedule a preview, superseding any pending one. Returns its generation.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(
        &mut self,
        service: Arc<dyn BuildableAreaService>,
        request: BuildableAreaRequest,
        site_area_m2: f64,
    ) -> u64 {
        self.cancel();
        let generation = self.generation;
        let debounce = self.debounce;
        let tx = self.results_tx.clone();

        self.in_flight = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            debug!(generation, service = service.name(), "Requesting buildable area preview");
            let result = service
                .calculate(&request)
                .await
                .and_then(|response| normalize_response(&response, site_area_m2, true));
            // the receiver lives as long as the scheduler
            let _ = tx.send(PreviewOutcome { generation, result });
        }));
        generation
    }

    /// Abort the pending preview; any result it already produced becomes stale
    pub fn cancel(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Wait for the current preview. `None` when nothing is pending.
    pub async fn next_outcome(&mut self) -> Option<PreviewOutcome> {
        while self.in_flight.is_some() {
            let outcome = self.results_rx.recv().await?;
            if outcome.generation == self.generation {
                self.in_flight = None;
                return Some(outcome);
            }
            debug!(stale = outcome.generation, current = self.generation, "Discarding stale preview");
        }
        None
    }

    /// Non-blocking variant of [`next_outcome`](Self::next_outcome)
    pub fn try_next_outcome(&mut self) -> Option<PreviewOutcome> {
        while let Ok(outcome) = self.results_rx.try_recv() {
            if outcome.generation == self.generation && self.in_flight.is_some() {
                self.in_flight = None;
                return Some(outcome);
            }
            debug!(stale = outcome.generation, current = self.generation, "Discarding stale preview");
        }
        None
    }
}

impl Drop for PreviewScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            handle.abort();
        }
    }
}
