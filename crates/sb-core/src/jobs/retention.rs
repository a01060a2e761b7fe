//! # Content Retention
//!
//! Deletes posts and comments older than [`RETENTION_HOURS`]. Comments of a
//! deleted post go with it.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use super::scheduler::Job;
use crate::models::PurgeCounts;
use crate::traits::RetentionStore;

/// Posts and comments older than this many hours are purged.
pub const RETENTION_HOURS: i64 = 72;

/// Expires forum content past the retention window.
pub struct RetentionSweeper {
    store: Arc<dyn RetentionStore>,
}

impl RetentionSweeper {
    pub fn new(store: Arc<dyn RetentionStore>) -> Self {
        Self { store }
    }

    pub async fn run(&self) -> anyhow::Result<PurgeCounts> {
        self.run_at(Utc::now()).await
    }

    /// Sweeps relative to `now`. Store errors abort the sweep.
    pub async fn run_at(&self, now: DateTime<Utc>) -> anyhow::Result<PurgeCounts> {
        let cutoff = now - TimeDelta::hours(RETENTION_HOURS);
        let purged = self.store.purge_older_than(cutoff).await?;
        info!(
            %cutoff,
            comments = purged.comments,
            posts = purged.posts,
            "Old posts and comments deleted"
        );
        Ok(purged)
    }
}

#[async_trait]
impl Job for RetentionSweeper {
    async fn execute(&self) -> anyhow::Result<()> {
        self.run().await.map(|_| ())
    }
}
