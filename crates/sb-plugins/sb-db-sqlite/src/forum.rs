use async_trait::async_trait;
use sb_core::models::{Comment, CommentView, NewComment, NewPost, Post, PostView};
use sb_core::traits::ForumRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::{contains_pattern, SqliteStore};

const POST_VIEW_SELECT: &str = "SELECT p.id, p.title, p.content, p.category, p.created_at, u.username AS author \
     FROM posts p JOIN users u ON u.id = p.user_id";

fn post_view(row: &SqliteRow) -> PostView {
    PostView {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        author: row.get("author"),
        created_at: row.get("created_at"),
        category: row.get("category"),
    }
}

#[async_trait]
impl ForumRepo for SqliteStore {
    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let done = sqlx::query(
            "INSERT INTO posts (title, content, category, user_id, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.category)
        .bind(post.user_id)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?;

        Ok(Post {
            id: done.last_insert_rowid(),
            title: post.title,
            content: post.content,
            category: post.category,
            user_id: post.user_id,
            created_at: post.created_at,
        })
    }

    async fn get_post(&self, id: i64) -> anyhow::Result<Option<PostView>> {
        let row = sqlx::query(&format!("{POST_VIEW_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(post_view))
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<PostView>> {
        let rows = sqlx::query(&format!(
            "{POST_VIEW_SELECT} ORDER BY p.created_at DESC, p.id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(post_view).collect())
    }

    async fn search_posts(&self, query: &str) -> anyhow::Result<Vec<PostView>> {
        let pattern = contains_pattern(query);
        let rows = sqlx::query(&format!(
            "{POST_VIEW_SELECT} WHERE p.title LIKE ?1 ESCAPE '\\' OR p.content LIKE ?1 ESCAPE '\\' \
             ORDER BY p.created_at DESC, p.id DESC"
        ))
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(post_view).collect())
    }

    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
        let done = sqlx::query(
            "INSERT INTO comments (content, user_id, post_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&comment.content)
        .bind(comment.user_id)
        .bind(comment.post_id)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id: done.last_insert_rowid(),
            content: comment.content,
            user_id: comment.user_id,
            post_id: comment.post_id,
            created_at: comment.created_at,
        })
    }

    async fn list_comments(&self, post_id: i64) -> anyhow::Result<Vec<CommentView>> {
        let rows = sqlx::query(
            "SELECT c.id, c.content, c.created_at, u.username AS author \
             FROM comments c JOIN users u ON u.id = c.user_id \
             WHERE c.post_id = ? ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| CommentView {
                id: row.get("id"),
                content: row.get("content"),
                author: row.get("author"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use sb_core::traits::UserRepo;

    async fn store_with_user() -> (SqliteStore, i64) {
        let store = SqliteStore::new("sqlite::memory:").await.unwrap();
        let user = store.create_user("amina", "hash").await.unwrap();
        (store, user.id)
    }

    fn new_post(user_id: i64, title: &str, age: TimeDelta) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: format!("{title} body"),
            category: "support".into(),
            user_id,
            created_at: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn test_posts_listed_newest_first_with_author() {
        let (store, user_id) = store_with_user().await;
        store.create_post(new_post(user_id, "older", TimeDelta::hours(2))).await.unwrap();
        let newer = store.create_post(new_post(user_id, "newer", TimeDelta::hours(1))).await.unwrap();

        let posts = store.list_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, newer.id);
        assert_eq!(posts[0].author, "amina");

        let single = store.get_post(newer.id).await.unwrap().unwrap();
        assert_eq!(single.title, "newer");
        assert!(store.get_post(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_on_title_and_content() {
        let (store, user_id) = store_with_user().await;
        store.create_post(new_post(user_id, "Workplace Rights", TimeDelta::zero())).await.unwrap();
        store.create_post(new_post(user_id, "Recipes", TimeDelta::zero())).await.unwrap();

        assert_eq!(store.search_posts("rights").await.unwrap().len(), 1);
        assert_eq!(store.search_posts("BODY").await.unwrap().len(), 2);
        assert!(store.search_posts("100%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_comments_listed_oldest_first() {
        let (store, user_id) = store_with_user().await;
        let post = store.create_post(new_post(user_id, "thread", TimeDelta::hours(3))).await.unwrap();
        for (content, age) in [("second", 1), ("first", 2)] {
            store
                .create_comment(NewComment {
                    content: content.into(),
                    user_id,
                    post_id: post.id,
                    created_at: Utc::now() - TimeDelta::hours(age),
                })
                .await
                .unwrap();
        }

        let comments = store.list_comments(post.id).await.unwrap();
        let contents: Vec<_> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(comments[0].author, "amina");
    }

    #[tokio::test]
    async fn test_comment_on_missing_post_fails() {
        let (store, user_id) = store_with_user().await;
        let result = store
            .create_comment(NewComment {
                content: "orphan".into(),
                user_id,
                post_id: 42,
                created_at: Utc::now(),
            })
            .await;
        assert!(result.is_err());
    }
}
