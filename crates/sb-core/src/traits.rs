//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::models::{
    ArticleCandidate, Comment, CommentView, NewArticle, NewComment, NewPost, NewsArticle, Post,
    PostView, PurgeCounts, User,
};

/// Persistence contract for posts and comments.
#[async_trait]
pub trait ForumRepo: Send + Sync {
    // Post Operations
    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post>;
    async fn get_post(&self, id: i64) -> anyhow::Result<Option<PostView>>;
    /// Newest first.
    async fn list_posts(&self) -> anyhow::Result<Vec<PostView>>;
    /// Case-insensitive substring match on title or content.
    async fn search_posts(&self, query: &str) -> anyhow::Result<Vec<PostView>>;

    // Comment Operations
    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Comment>;
    /// Oldest first.
    async fn list_comments(&self, post_id: i64) -> anyhow::Result<Vec<CommentView>>;
}

/// Persistence contract for accounts.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, username: &str, password_hash: &str) -> anyhow::Result<User>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn get_user(&self, id: i64) -> anyhow::Result<Option<User>>;
}

/// Storage for the cached news articles.
///
/// Writes go through a [`NewsBatch`] so the ingestor decides where the
/// commit checkpoints fall.
#[async_trait]
pub trait NewsStore: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn NewsBatch>>;
    /// Case-insensitive title match, newest published first.
    async fn search_articles(&self, query: &str) -> anyhow::Result<Vec<NewsArticle>>;
}

/// An open unit of work against the article table. Dropping it without
/// calling [`NewsBatch::commit`] discards its changes.
#[async_trait]
pub trait NewsBatch: Send {
    /// Sees rows inserted earlier in the same batch.
    async fn url_exists(&mut self, url: &str) -> anyhow::Result<bool>;
    async fn insert(&mut self, article: NewArticle) -> anyhow::Result<()>;
    async fn count(&mut self) -> anyhow::Result<u64>;
    /// Deletes the row with the earliest published timestamp (ties by id).
    /// Returns false when the table is empty.
    async fn delete_earliest(&mut self) -> anyhow::Result<bool>;
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
}

/// Age-based purging of user content.
#[async_trait]
pub trait RetentionStore: Send + Sync {
    /// Deletes comments, then posts, created strictly before `cutoff`, in a
    /// single transaction. Comments of deleted posts go with them.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> anyhow::Result<PurgeCounts>;
}

/// External news search contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// One search request for `keyword`. Non-success responses are errors.
    async fn search(&self, keyword: &str) -> anyhow::Result<Vec<ArticleCandidate>>;
}

/// Which of the two JWTs a token is meant to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Identity contract: password hashing and bearer tokens.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produces an Argon2 PHC string for storage.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash.
    async fn verify_password(&self, password: &str, hash: &str) -> bool;

    /// Signs a token for `user_id` that expires after `ttl`.
    fn issue_token(&self, user_id: i64, kind: TokenKind, ttl: TimeDelta) -> anyhow::Result<String>;

    /// Returns the user id carried by a valid, unexpired token of `kind`.
    fn verify_token(&self, token: &str, kind: TokenKind) -> crate::error::Result<i64>;
}
