//! # News Ingestion
//!
//! Pulls articles for a fixed keyword set, stores the ones whose URL is new,
//! and keeps the article table capped at [`NEWS_CAPACITY`] rows by evicting
//! the earliest-published ones.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, warn};

use super::scheduler::Job;
use crate::models::{ArticleCandidate, NewArticle};
use crate::traits::{NewsSource, NewsStore};

/// Search terms queried on every run, in order.
pub const NEWS_KEYWORDS: [&str; 4] = ["women", "gender equality", "women's rights", "femicide"];

/// Maximum number of cached articles kept after a run.
pub const NEWS_CAPACITY: u64 = 50;

const PUBLISHED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Outcome of one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Candidates returned across all keywords, duplicates included
    pub fetched: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub parse_failures: usize,
    pub evicted: usize,
    /// Keywords whose search request failed
    pub failed_keywords: Vec<String>,
}

pub struct NewsIngestor {
    source: Arc<dyn NewsSource>,
    store: Arc<dyn NewsStore>,
}

impl NewsIngestor {
    pub fn new(source: Arc<dyn NewsSource>, store: Arc<dyn NewsStore>) -> Self {
        Self { source, store }
    }

    /// Runs one fetch-dedupe-insert-trim cycle.
    ///
    /// Changes are committed twice: once after the insert loop and once
    /// after the final capacity pass. A store error aborts the run and
    /// rolls back whichever batch is open.
    pub async fn run(&self) -> anyhow::Result<IngestReport> {
        let fetched_at = Utc::now();
        let mut report = IngestReport::default();
        let candidates = self.collect(&mut report).await;
        report.fetched = candidates.len();

        let mut batch = self.store.begin().await?;
        for candidate in candidates {
            if batch.url_exists(&candidate.url).await? {
                report.duplicates += 1;
                continue;
            }

            let published_at = match parse_published(&candidate.published) {
                Ok(ts) => ts,
                Err(err) => {
                    warn!(
                        url = %candidate.url,
                        published = %candidate.published,
                        error = %err,
                        "Skipping article with unparseable publish date"
                    );
                    report.parse_failures += 1;
                    continue;
                }
            };

            batch
                .insert(NewArticle {
                    title: candidate.title,
                    description: candidate.description,
                    url: candidate.url,
                    image: candidate.image,
                    published_at: Some(published_at),
                    fetched_at,
                })
                .await?;
            report.inserted += 1;

            if batch.count().await? > NEWS_CAPACITY && batch.delete_earliest().await? {
                report.evicted += 1;
            }
        }
        batch.commit().await?;

        let mut batch = self.store.begin().await?;
        while batch.count().await? > NEWS_CAPACITY {
            if !batch.delete_earliest().await? {
                break;
            }
            report.evicted += 1;
        }
        batch.commit().await?;

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            duplicates = report.duplicates,
            parse_failures = report.parse_failures,
            evicted = report.evicted,
            failed_keywords = report.failed_keywords.len(),
            "News ingestion finished"
        );
        Ok(report)
    }

    /// One request per keyword; a failed keyword contributes nothing.
    async fn collect(&self, report: &mut IngestReport) -> Vec<ArticleCandidate> {
        let mut all = Vec::new();
        for keyword in NEWS_KEYWORDS {
            match self.source.search(keyword).await {
                Ok(mut articles) => all.append(&mut articles),
                Err(err) => {
                    warn!(keyword, error = %err, "Error fetching news for keyword");
                    report.failed_keywords.push(keyword.to_string());
                }
            }
        }
        all
    }
}

#[async_trait]
impl Job for NewsIngestor {
    async fn execute(&self) -> anyhow::Result<()> {
        self.run().await.map(|_| ())
    }
}

/// Parses the provider's `published` field.
///
/// The provider appends a zone offset such as `+0000`. The last five
/// characters are dropped and the trimmed remainder is read as UTC.
pub fn parse_published(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let cut = raw.char_indices().rev().nth(4).map_or(0, |(i, _)| i);
    NaiveDateTime::parse_from_str(raw[..cut].trim(), PUBLISHED_FORMAT).map(|ts| ts.and_utc())
}
