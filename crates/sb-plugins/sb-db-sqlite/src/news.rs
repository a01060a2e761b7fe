use async_trait::async_trait;
use sb_core::models::{NewArticle, NewsArticle};
use sb_core::traits::{NewsBatch, NewsStore};
use sqlx::{Row, Sqlite, Transaction};

use crate::{contains_pattern, SqliteStore};

#[async_trait]
impl NewsStore for SqliteStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn NewsBatch>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteNewsBatch { tx }))
    }

    async fn search_articles(&self, query: &str) -> anyhow::Result<Vec<NewsArticle>> {
        let rows = sqlx::query(
            "SELECT id, title, description, url, image, published_at, fetched_at FROM news_articles \
             WHERE title LIKE ? ESCAPE '\\' ORDER BY published_at DESC, id DESC",
        )
        .bind(contains_pattern(query))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| NewsArticle {
                id: row.get("id"),
                title: row.get("title"),
                description: row.get("description"),
                url: row.get("url"),
                image: row.get("image"),
                published_at: row.get("published_at"),
                fetched_at: row.get("fetched_at"),
            })
            .collect())
    }
}

/// A news batch is one SQLite transaction; dropping it rolls back.
struct SqliteNewsBatch {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl NewsBatch for SqliteNewsBatch {
    async fn url_exists(&mut self, url: &str) -> anyhow::Result<bool> {
        let hit: Option<i64> = sqlx::query_scalar("SELECT 1 FROM news_articles WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(hit.is_some())
    }

    async fn insert(&mut self, article: NewArticle) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO news_articles (title, description, url, image, published_at, fetched_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(article.title)
        .bind(article.description)
        .bind(article.url)
        .bind(article.image)
        .bind(article.published_at)
        .bind(article.fetched_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn count(&mut self) -> anyhow::Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news_articles")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(n as u64)
    }

    /// SQLite sorts NULL timestamps first, so undated rows go before dated ones.
    async fn delete_earliest(&mut self) -> anyhow::Result<bool> {
        let done = sqlx::query(
            "DELETE FROM news_articles WHERE id = \
             (SELECT id FROM news_articles ORDER BY published_at ASC, id ASC LIMIT 1)",
        )
        .execute(&mut *self.tx)
        .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn article(url: &str, published_hour: u32) -> NewArticle {
        NewArticle {
            title: format!("Article {url}"),
            description: None,
            url: url.to_string(),
            image: Some("https://img.example/x.png".into()),
            published_at: Some(Utc.with_ymd_and_hms(2024, 10, 30, published_hour, 0, 0).unwrap()),
            fetched_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_uncommitted_batch_is_rolled_back() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();

        let mut batch = store.begin().await.unwrap();
        batch.insert(article("https://a", 1)).await.unwrap();
        assert!(batch.url_exists("https://a").await.unwrap());
        drop(batch);

        let mut batch = store.begin().await.unwrap();
        assert_eq!(batch.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_earliest_uses_published_order() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        let mut batch = store.begin().await.unwrap();
        batch.insert(article("https://late", 9)).await.unwrap();
        batch.insert(article("https://early", 2)).await.unwrap();
        batch.insert(article("https://mid", 5)).await.unwrap();

        assert!(batch.delete_earliest().await.unwrap());
        assert!(!batch.url_exists("https://early").await.unwrap());
        assert_eq!(batch.count().await.unwrap(), 2);
        batch.commit().await.unwrap();

        let mut batch = store.begin().await.unwrap();
        batch.delete_earliest().await.unwrap();
        batch.delete_earliest().await.unwrap();
        assert!(!batch.delete_earliest().await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_url_rejected_by_schema() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        let mut batch = store.begin().await.unwrap();
        batch.insert(article("https://a", 1)).await.unwrap();
        assert!(batch.insert(article("https://a", 2)).await.is_err());
    }

    #[tokio::test]
    async fn test_search_articles_newest_first() {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        let mut batch = store.begin().await.unwrap();
        batch.insert(article("https://one", 1)).await.unwrap();
        batch.insert(article("https://two", 2)).await.unwrap();
        batch.commit().await.unwrap();

        let found = store.search_articles("ARTICLE").await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].url, "https://two");
        assert_eq!(
            found[1].published_at.unwrap() + TimeDelta::hours(1),
            found[0].published_at.unwrap()
        );
        assert!(store.search_articles("missing").await.unwrap().is_empty());
    }
}
