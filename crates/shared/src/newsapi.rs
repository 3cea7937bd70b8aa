use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::models::RawArticle;

/// NewsAPI source ids queried by default.
pub const DEFAULT_SOURCES: &[&str] = &[
    "reuters",
    "associated-press",
    "bloomberg",
    "bbc-news",
    "the-wall-street-journal",
    "npr",
    "financial-times",
    "cnbc",
    "politico",
    "ap-news",
];

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
    #[serde(default, rename = "totalResults")]
    total_results: usize,
}

pub struct NewsApiClient {
    client: Client,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("daily-digest/0.1")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, api_key })
    }

    fn everything_url(sources: &[&str], since: DateTime<Utc>) -> String {
        format!(
            "https://newsapi.org/v2/everything?sources={}&from={}&language=en&sortBy=publishedAt&pageSize=100",
            urlencoding::encode(&sources.join(",")),
            urlencoding::encode(&since.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        )
    }

    /// Fetch English articles from the given sources published since `since`.
    pub async fn fetch_articles(
        &self,
        sources: &[&str],
        since: DateTime<Utc>,
    ) -> Result<Vec<RawArticle>> {
        let url = Self::everything_url(sources, since);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch articles from NewsAPI")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("NewsAPI returned error: {} - {}", status, error_text);
        }

        let news_response = response
            .json::<NewsApiResponse>()
            .await
            .context("Failed to parse NewsAPI response")?;

        info!(
            "NewsAPI returned {} of {} matching articles",
            news_response.articles.len(),
            news_response.total_results
        );

        Ok(news_response.articles)
    }
}
