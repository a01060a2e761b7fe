//! # sb-news-currents
//!
//! `NewsSource` backed by the Currents search API.
//! One GET per keyword, English results only, no retries.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use sb_core::error::AppError;
use sb_core::models::ArticleCandidate;
use sb_core::traits::NewsSource;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

pub const CURRENTS_SEARCH_URL: &str = "https://api.currentsapi.services/v1/search";

/// Records are kept raw so one malformed entry does not sink the rest.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<Value>,
}

pub struct CurrentsClient {
    client: Client,
    endpoint: String,
    api_key: SecretString,
}

impl CurrentsClient {
    pub fn new(api_key: SecretString) -> anyhow::Result<Self> {
        Self::with_endpoint(api_key, CURRENTS_SEARCH_URL)
    }

    /// Points the client at another search endpoint (a mock server in tests).
    pub fn with_endpoint(api_key: SecretString, endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sister-board/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl NewsSource for CurrentsClient {
    async fn search(&self, keyword: &str) -> anyhow::Result<Vec<ArticleCandidate>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("apiKey", self.api_key.expose_secret()),
                ("keywords", keyword),
                ("language", "en"),
            ])
            .send()
            .await
            .with_context(|| format!("news search request for {keyword:?} failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
            }
            .into());
        }

        let body: SearchResponse = response
            .json()
            .await
            .with_context(|| format!("malformed news search body for {keyword:?}"))?;
        let total = body.news.len();
        let articles: Vec<ArticleCandidate> = body
            .news
            .into_iter()
            .filter_map(|raw| match serde_json::from_value(raw) {
                Ok(article) => Some(article),
                Err(err) => {
                    warn!(keyword, error = %err, "Skipping malformed news record");
                    None
                }
            })
            .collect();
        debug!(keyword, total, kept = articles.len(), "News search returned");
        Ok(articles)
    }
}
