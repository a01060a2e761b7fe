//! # Background Maintenance
//!
//! The two periodic jobs (news ingestion and content retention) and the
//! service object that owns their schedule.

pub mod ingest;
pub mod retention;
pub mod scheduler;

use std::sync::Arc;
use std::time::Duration;

pub use ingest::{parse_published, IngestReport, NewsIngestor, NEWS_CAPACITY, NEWS_KEYWORDS};
pub use retention::{RetentionSweeper, RETENTION_HOURS};
pub use scheduler::{Job, Scheduler};

use crate::traits::{NewsSource, NewsStore, RetentionStore};

pub const NEWS_JOB_ID: &str = "news_job";
pub const RETENTION_JOB_ID: &str = "delete_old_content_job";

pub const FETCH_INTERVAL: Duration = Duration::from_secs(40 * 60);
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Owns the jobs and the runner that fires them.
///
/// Built once at startup; dropping it stops the jobs.
pub struct MaintenanceService {
    scheduler: Scheduler,
    ingestor: Arc<NewsIngestor>,
    sweeper: Arc<RetentionSweeper>,
}

impl MaintenanceService {
    pub fn new(
        source: Arc<dyn NewsSource>,
        news: Arc<dyn NewsStore>,
        retention: Arc<dyn RetentionStore>,
    ) -> Self {
        Self {
            scheduler: Scheduler::new(),
            ingestor: Arc::new(NewsIngestor::new(source, news)),
            sweeper: Arc::new(RetentionSweeper::new(retention)),
        }
    }

    /// Registers both jobs. Calling it again re-registers them in place.
    pub fn start(&self) {
        self.scheduler
            .add_job(NEWS_JOB_ID, FETCH_INTERVAL, self.ingestor.clone());
        self.scheduler
            .add_job(RETENTION_JOB_ID, SWEEP_INTERVAL, self.sweeper.clone());
    }

    pub fn ingestor(&self) -> &NewsIngestor {
        &self.ingestor
    }

    pub fn sweeper(&self) -> &RetentionSweeper {
        &self.sweeper
    }

    pub fn job_ids(&self) -> Vec<&'static str> {
        self.scheduler.job_ids()
    }

    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }
}
