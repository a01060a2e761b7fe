//! # Scheduler
//!
//! A minimal in-process interval runner. Each registered job gets its own
//! tokio task that sleeps one interval, runs the job, and repeats. A job's
//! invocations never overlap each other; different jobs are independent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// A unit of periodic background work.
#[async_trait]
pub trait Job: Send + Sync + 'static {
    async fn execute(&self) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Mutex<HashMap<&'static str, JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `job` to run every `every`, first run one interval from now.
    ///
    /// Registering an id that is already present replaces the old job.
    /// Must be called from within a tokio runtime.
    pub fn add_job(&self, id: &'static str, every: Duration, job: Arc<dyn Job>) {
        let handle = tokio::spawn(run_every(id, every, job));
        let previous = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle);

        match previous {
            Some(old) => {
                old.abort();
                info!(job = id, every_secs = every.as_secs(), "Replaced scheduled job");
            }
            None => info!(job = id, every_secs = every.as_secs(), "Scheduled job"),
        }
    }

    pub fn job_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Aborts every job task. Jobs mid-run are dropped at their next await.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for (id, handle) in tasks.drain() {
            handle.abort();
            debug!(job = id, "Stopped job");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_every(id: &'static str, every: Duration, job: Arc<dyn Job>) {
    let mut ticker = interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let started = Instant::now();
        match job.execute().await {
            Ok(()) => debug!(
                job = id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Job finished"
            ),
            Err(err) => error!(
                job = id,
                error = %err,
                "Job failed, will run again next interval"
            ),
        }
    }
}
