use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::pipeline::RunStats;

/// The fixed set of digest categories, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Technology,
    Health,
    #[serde(rename = "Government/Policy")]
    GovernmentPolicy,
    Economy,
    Finance,
    World,
    Space,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Technology,
        Category::Health,
        Category::GovernmentPolicy,
        Category::Economy,
        Category::Finance,
        Category::World,
        Category::Space,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Technology => "Technology",
            Category::Health => "Health",
            Category::GovernmentPolicy => "Government/Policy",
            Category::Economy => "Economy",
            Category::Finance => "Finance",
            Category::World => "World",
            Category::Space => "Space",
        }
    }

    /// Parse a label returned by the classification service.
    ///
    /// Only the exact vocabulary is accepted (case-insensitive, surrounding
    /// whitespace and quotes ignored). Anything else is `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        let cleaned = label.trim().trim_matches(|c| c == '"' || c == '\'').trim();
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(cleaned))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Publication time of an article. Absent or unparseable timestamps are
/// `Unknown` and never count as recent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishedAt {
    Known(DateTime<Utc>),
    Unknown,
}

impl PublishedAt {
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .filter(|s| !s.is_empty())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| PublishedAt::Known(dt.with_timezone(&Utc)))
            .unwrap_or(PublishedAt::Unknown)
    }
}

impl Serialize for PublishedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PublishedAt::Known(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            PublishedAt::Unknown => serializer.serialize_str("unknown"),
        }
    }
}

impl<'de> Deserialize<'de> for PublishedAt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(PublishedAt::parse(raw.as_deref()))
    }
}

/// Source field as sent by feeds: NewsAPI nests it in an object, other
/// fetchers hand over a plain name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSource {
    Name(String),
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl RawSource {
    pub fn name(&self) -> Option<&str> {
        match self {
            RawSource::Name(name) => Some(name.as_str()),
            RawSource::Object { name, id } => name.as_deref().or(id.as_deref()),
        }
    }
}

/// An article record as received from a news feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub source: Option<RawSource>,
    #[serde(default, rename = "publishedAt", alias = "published_at")]
    pub published_at: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// A normalized news item flowing through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub source: String,
    pub published_at: PublishedAt,
    pub url: String,
    pub score: Option<f64>,
    pub category: Option<Category>,
}

impl Article {
    /// Title, description and content joined and lower-cased, the text every
    /// topic lexicon is matched against. Space-terminated so a term like
    /// "fed " still matches as the last word.
    pub fn search_text(&self) -> String {
        format!("{} {} {} ", self.title, self.description, self.content).to_lowercase()
    }

    /// Title and description only, the text sent for classification.
    pub fn headline_text(&self) -> String {
        format!("{} {} ", self.title, self.description).to_lowercase()
    }

    pub fn score_or_zero(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

/// Output of one run, handed to downstream consumers.
#[derive(Debug, Serialize, Deserialize)]
pub struct Digest {
    pub version: String,
    pub created_at: String,
    pub stats: RunStats,
    pub articles: Vec<Article>,
}

impl Digest {
    pub fn new(stats: RunStats, articles: Vec<Article>) -> Self {
        Self {
            version: "1.0".to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            stats,
            articles,
        }
    }
}
