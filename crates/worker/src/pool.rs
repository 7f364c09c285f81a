//! Rate-limited fetch worker pool.
//!
//! A fixed number of worker tasks pull work items from one bounded queue.
//! Each worker paces itself (see [`Pacer`]) and bounds every call with a
//! timeout. Completions are delivered on a channel in the order they finish.
//! A failed or timed-out call produces a failed completion for that item
//! only; siblings keep running.

use async_trait::async_trait;
use enrich_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::pacer::Pacer;

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Minimum gap between two calls from the same worker, in milliseconds
    #[serde(default = "default_spacing_ms")]
    pub spacing_ms: u64,
    /// Pending work items buffered ahead of the workers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

fn default_workers() -> usize {
    3
}

fn default_spacing_ms() -> u64 {
    1100
}

fn default_queue_capacity() -> usize {
    64
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            spacing_ms: default_spacing_ms(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl PoolConfig {
    pub fn spacing(&self) -> Duration {
        Duration::from_millis(self.spacing_ms)
    }

    /// Upper bound on aggregate calls per second.
    pub fn max_calls_per_sec(&self) -> f64 {
        if self.spacing_ms == 0 {
            return f64::INFINITY;
        }
        self.workers.max(1) as f64 * 1000.0 / self.spacing_ms as f64
    }
}

/// One kind of remote call the pool can execute.
#[async_trait]
pub trait FetchJob: Send + Sync + 'static {
    type Item: Send + Sync + Debug + 'static;
    type Output: Send + 'static;

    async fn fetch(&self, item: &Self::Item) -> Result<Self::Output>;
}

/// Outcome of one work item.
#[derive(Debug)]
pub struct Completion<I, O> {
    pub item: I,
    /// Worker slot that ran the call
    pub slot: usize,
    pub outcome: Result<O>,
}

/// Bounded pool of paced workers executing one [`FetchJob`].
pub struct WorkerPool<J: FetchJob> {
    job: Arc<J>,
    config: PoolConfig,
    call_timeout: Duration,
}

impl<J: FetchJob> WorkerPool<J> {
    pub fn new(job: Arc<J>, config: PoolConfig, call_timeout: Duration) -> Self {
        Self {
            job,
            config,
            call_timeout,
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Start the workers and feed them `items`.
    ///
    /// The returned receiver yields exactly one completion per item and
    /// closes once every item has been reported.
    pub fn dispatch(
        &self,
        items: Vec<J::Item>,
    ) -> mpsc::Receiver<Completion<J::Item, J::Output>> {
        let workers = self.config.workers.max(1);
        let (work_tx, work_rx) = mpsc::channel::<J::Item>(self.config.queue_capacity.max(1));
        let (done_tx, done_rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let work_rx = Arc::new(Mutex::new(work_rx));

        info!(
            items = items.len(),
            workers = workers,
            spacing_ms = self.config.spacing_ms,
            max_calls_per_sec = self.config.max_calls_per_sec(),
            "Dispatching work to pool"
        );

        // Feeder: blocks on the bounded queue, then closes it.
        metrics().queue_depth.set(items.len() as u64);
        tokio::spawn(async move {
            for item in items {
                if work_tx.send(item).await.is_err() {
                    break;
                }
            }
        });

        let _handles: Vec<JoinHandle<()>> = (0..workers)
            .map(|slot| {
                let worker = Worker {
                    slot,
                    job: self.job.clone(),
                    queue: work_rx.clone(),
                    done: done_tx.clone(),
                    pacer: Pacer::new(self.config.spacing()),
                    call_timeout: self.call_timeout,
                };
                tokio::spawn(worker.run())
            })
            .collect();

        done_rx
    }
}

struct Worker<J: FetchJob> {
    slot: usize,
    job: Arc<J>,
    queue: Arc<Mutex<mpsc::Receiver<J::Item>>>,
    done: mpsc::Sender<Completion<J::Item, J::Output>>,
    pacer: Pacer,
    call_timeout: Duration,
}

impl<J: FetchJob> Worker<J> {
    async fn run(mut self) {
        debug!(slot = self.slot, "Worker started");

        loop {
            let next = { self.queue.lock().await.recv().await };
            let Some(item) = next else {
                break;
            };
            metrics().queue_depth.dec();

            self.pacer.ready().await;

            metrics().workers_busy.inc();
            metrics().lookups_issued.inc();
            let started = Instant::now();

            let outcome = match tokio::time::timeout(self.call_timeout, self.job.fetch(&item)).await {
                Ok(result) => result,
                Err(_) => {
                    metrics().lookups_timed_out.inc();
                    warn!(slot = self.slot, item = ?item, timeout = ?self.call_timeout, "Lookup timed out");
                    Err(Error::Timeout(self.call_timeout))
                }
            };

            self.pacer.record_call();
            metrics()
                .lookup_latency_ms
                .observe(started.elapsed().as_millis() as u64);
            metrics().workers_busy.dec();

            let completion = Completion {
                item,
                slot: self.slot,
                outcome,
            };
            if self.done.send(completion).await.is_err() {
                warn!(slot = self.slot, "Completion receiver dropped; stopping worker");
                break;
            }
        }

        debug!(slot = self.slot, "Worker finished");
    }
}
