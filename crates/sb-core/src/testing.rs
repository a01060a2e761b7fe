//! In-memory port implementations for tests.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::models::{NewArticle, NewsArticle, PurgeCounts};
use crate::traits::{NewsBatch, NewsStore, RetentionStore};

#[derive(Default)]
struct Articles {
    rows: Vec<NewsArticle>,
    next_id: i64,
}

/// Article table kept in a `Vec`. Batches work on a copy and swap it in on commit.
#[derive(Clone, Default)]
pub struct MemoryNewsStore {
    inner: Arc<Mutex<Articles>>,
    fail_on_insert: Option<usize>,
}

impl MemoryNewsStore {
    /// A store whose batches error on their `n`th insert (1-based).
    pub fn failing_on_insert(n: usize) -> Self {
        Self {
            fail_on_insert: Some(n),
            ..Self::default()
        }
    }

    /// Inserts `n` articles published one minute apart starting at `from`.
    pub fn seed(&self, n: usize, from: DateTime<Utc>) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        for i in 0..n {
            inner.next_id += 1;
            let id = inner.next_id;
            inner.rows.push(NewsArticle {
                id,
                title: format!("Seeded {i}"),
                description: None,
                url: format!("https://seed.example/{i}"),
                image: None,
                published_at: Some(from + TimeDelta::minutes(i as i64)),
                fetched_at: from,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn urls(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.rows.iter().map(|a| a.url.clone()).collect()
    }

    pub fn earliest_url(&self) -> Option<String> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        earliest(&inner.rows).map(|i| inner.rows[i].url.clone())
    }
}

fn earliest(rows: &[NewsArticle]) -> Option<usize> {
    rows.iter()
        .enumerate()
        .min_by_key(|(_, a)| (a.published_at, a.id))
        .map(|(i, _)| i)
}

#[async_trait]
impl NewsStore for MemoryNewsStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn NewsBatch>> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(Box::new(MemoryBatch {
            target: self.inner.clone(),
            rows: inner.rows.clone(),
            next_id: inner.next_id,
            inserts: 0,
            fail_on_insert: self.fail_on_insert,
        }))
    }

    async fn search_articles(&self, query: &str) -> anyhow::Result<Vec<NewsArticle>> {
        let needle = query.to_lowercase();
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<_> = inner
            .rows
            .iter()
            .filter(|a| a.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(found)
    }
}

struct MemoryBatch {
    target: Arc<Mutex<Articles>>,
    rows: Vec<NewsArticle>,
    next_id: i64,
    inserts: usize,
    fail_on_insert: Option<usize>,
}

#[async_trait]
impl NewsBatch for MemoryBatch {
    async fn url_exists(&mut self, url: &str) -> anyhow::Result<bool> {
        Ok(self.rows.iter().any(|a| a.url == url))
    }

    async fn insert(&mut self, article: NewArticle) -> anyhow::Result<()> {
        self.inserts += 1;
        if self.fail_on_insert == Some(self.inserts) {
            anyhow::bail!("disk I/O error");
        }
        if self.rows.iter().any(|a| a.url == article.url) {
            anyhow::bail!("UNIQUE constraint failed: news_articles.url");
        }
        self.next_id += 1;
        self.rows.push(NewsArticle {
            id: self.next_id,
            title: article.title,
            description: article.description,
            url: article.url,
            image: article.image,
            published_at: article.published_at,
            fetched_at: article.fetched_at,
        });
        Ok(())
    }

    async fn count(&mut self) -> anyhow::Result<u64> {
        Ok(self.rows.len() as u64)
    }

    async fn delete_earliest(&mut self) -> anyhow::Result<bool> {
        match earliest(&self.rows) {
            Some(i) => {
                self.rows.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let mut target = self.target.lock().unwrap_or_else(PoisonError::into_inner);
        target.rows = self.rows;
        target.next_id = self.next_id;
        Ok(())
    }
}

/// Records the cutoffs it was asked to purge at.
#[derive(Clone, Default)]
pub struct MemoryRetentionStore {
    cutoffs: Arc<Mutex<Vec<DateTime<Utc>>>>,
    fail: bool,
}

impl MemoryRetentionStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn cutoffs(&self) -> Vec<DateTime<Utc>> {
        self.cutoffs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RetentionStore for MemoryRetentionStore {
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<PurgeCounts> {
        if self.fail {
            anyhow::bail!("database is locked");
        }
        self.cutoffs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(cutoff);
        Ok(PurgeCounts::default())
    }
}
