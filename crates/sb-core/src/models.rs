//! # Domain Models
//!
//! These structs represent the core entities of Sister-Board.
//! Rows use integer ids assigned by the store; timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A registered forum member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2 PHC string, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// A top-level forum post. Purged once older than the retention window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A post joined with its author's username, as the API renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub category: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A reply attached to a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub id: i64,
    pub content: String,
    pub author: String,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub user_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A cached external news article. The source URL is the natural key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    #[serde(skip_serializing)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

/// One record as returned by the news search API, before normalization.
///
/// `published` is the raw provider string, e.g. `"2024-10-30 00:27:39 +0000"`.
/// A `null` title or date decodes as empty; an empty date fails to parse and
/// only that record is skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleCandidate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rows removed by one retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeCounts {
    pub comments: u64,
    pub posts: u64,
}
