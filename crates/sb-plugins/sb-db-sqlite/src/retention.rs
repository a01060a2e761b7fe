use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sb_core::models::PurgeCounts;
use sb_core::traits::RetentionStore;

use crate::SqliteStore;

#[async_trait]
impl RetentionStore for SqliteStore {
    /// Comments go first so the count reflects rows removed on their own age;
    /// the post delete then cascades to whatever comments remain.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<PurgeCounts> {
        let mut tx = self.pool.begin().await?;

        let comments = sqlx::query("DELETE FROM comments WHERE created_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let posts = sqlx::query("DELETE FROM posts WHERE created_at < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(PurgeCounts { comments, posts })
    }
}
