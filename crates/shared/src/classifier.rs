use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{Article, Category};

pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Request to classification service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Classification service returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Malformed classification response: {0}")]
    Malformed(String),

    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),
}

/// What gets sent for each article: its position in the batch plus the
/// headline fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationItem {
    pub index: usize,
    pub title: String,
    pub description: String,
}

impl ClassificationItem {
    pub fn from_articles(articles: &[Article]) -> Vec<Self> {
        articles
            .iter()
            .enumerate()
            .map(|(index, article)| Self {
                index,
                title: article.title.clone(),
                description: article.description.clone(),
            })
            .collect()
    }
}

/// One label as answered by the service, matched back to the batch by index.
/// The label text is checked against the vocabulary by the categorizer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Label {
    pub index: usize,
    pub category: String,
}

/// A batch classification service. One call per batch; implementations must
/// not retry.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, items: &[ClassificationItem]) -> Result<Vec<Label>, ClassifyError>;
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    text: String,
}

#[derive(Deserialize)]
struct LabelsResult {
    labels: Vec<Label>,
}

pub struct ClaudeClassifier {
    client: Client,
    api_key: String,
    model: String,
}

impl ClaudeClassifier {
    pub fn new(api_key: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    fn build_prompt(items: &[ClassificationItem]) -> String {
        let articles_text = items
            .iter()
            .map(|item| format!("{}: {} - {}", item.index, item.title, item.description))
            .collect::<Vec<_>>()
            .join("\n");

        let vocabulary = Category::ALL
            .iter()
            .map(|c| c.label())
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            r#"You are categorizing news articles for a daily news digest.

Assign every article exactly one category from this list, spelled exactly as shown:
{}

Articles:
{}

Format your response as JSON:
{{
  "labels": [
    {{ "index": 0, "category": "Technology" }},
    {{ "index": 1, "category": "Economy" }}
  ]
}}

Important: Every article index from 0 to {} must appear exactly once."#,
            vocabulary,
            articles_text,
            items.len().saturating_sub(1)
        )
    }

    fn parse_labels(response_text: &str) -> Result<Vec<Label>, ClassifyError> {
        let json_text = match (response_text.find('{'), response_text.rfind('}')) {
            (Some(start), Some(end)) if start < end => &response_text[start..=end],
            _ => {
                return Err(ClassifyError::Malformed(
                    "no JSON object in response".to_string(),
                ))
            }
        };

        let result: LabelsResult = serde_json::from_str(json_text)
            .map_err(|e| ClassifyError::Malformed(e.to_string()))?;

        Ok(result.labels)
    }
}

#[async_trait]
impl Classifier for ClaudeClassifier {
    async fn classify(&self, items: &[ClassificationItem]) -> Result<Vec<Label>, ClassifyError> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: 2048,
            messages: vec![Message {
                role: "user".to_string(),
                content: Self::build_prompt(items),
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(ClassifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let claude_response = response
            .json::<ClaudeResponse>()
            .await
            .map_err(|e| ClassifyError::Malformed(e.to_string()))?;

        let response_text = claude_response
            .content
            .first()
            .map(|c| c.text.as_str())
            .unwrap_or("");

        Self::parse_labels(response_text)
    }
}
