//! Static rule tables consumed by the scorer and the keyword classifier.
//!
//! Everything here is plain data. The defaults are the tables the daily
//! digest ships with; a JSON rules file can replace any of them.

use serde::{Deserialize, Serialize};

use crate::models::Category;

/// A named set of terms. Any one term occurring in the article awards
/// `weight` once; `category` ties the group to the keyword classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexiconGroup {
    pub name: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub category: Option<Category>,
    pub terms: Vec<String>,
}

impl LexiconGroup {
    pub fn new(name: &str, weight: f64, category: Option<Category>, terms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            weight,
            category,
            terms: terms.iter().map(|t| t.to_lowercase()).collect(),
        }
    }

    /// True if any term occurs in `text`, which must already be lower-cased.
    pub fn matches(&self, text: &str) -> bool {
        self.terms.iter().any(|term| text.contains(&term.to_lowercase()))
    }

    /// Number of distinct terms occurring in `text` (lower-cased).
    pub fn match_count(&self, text: &str) -> usize {
        self.terms
            .iter()
            .filter(|term| text.contains(&term.to_lowercase()))
            .count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecencyRule {
    pub fresh_hours: i64,
    pub fresh_bonus: f64,
    pub recent_hours: i64,
    pub recent_bonus: f64,
}

impl Default for RecencyRule {
    fn default() -> Self {
        Self {
            fresh_hours: 6,
            fresh_bonus: 2.0,
            recent_hours: 12,
            recent_bonus: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LengthRule {
    pub long_chars: usize,
    pub long_bonus: f64,
    pub medium_chars: usize,
    pub medium_bonus: f64,
}

impl Default for LengthRule {
    fn default() -> Self {
        Self {
            long_chars: 500,
            long_bonus: 1.0,
            medium_chars: 200,
            medium_bonus: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub trusted_sources: Vec<String>,
    pub trusted_source_bonus: f64,
    pub breaking: LexiconGroup,
    pub topic_groups: Vec<LexiconGroup>,
    pub recency: RecencyRule,
    pub length: LengthRule,
}

impl RuleSet {
    /// Groups tagged with `category`, used by the keyword classifier.
    pub fn groups_for(&self, category: Category) -> impl Iterator<Item = &LexiconGroup> {
        self.topic_groups
            .iter()
            .filter(move |group| group.category == Some(category))
    }

    /// Reject tables the scorer cannot use, such as recency windows that do
    /// not fit in a duration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let recency = &self.recency;
        for (field, hours) in [
            ("fresh_hours", recency.fresh_hours),
            ("recent_hours", recency.recent_hours),
        ] {
            if hours < 0 || chrono::Duration::try_hours(hours).is_none() {
                anyhow::bail!("recency.{} is out of range: {}", field, hours);
            }
        }
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            trusted_sources: [
                "reuters",
                "associated press",
                "ap news",
                "bloomberg",
                "bbc",
                "wall street journal",
                "npr",
                "financial times",
                "cnbc",
                "politico",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            trusted_source_bonus: 3.0,
            breaking: LexiconGroup::new(
                "breaking",
                2.5,
                None,
                &["breaking", "urgent", "just in", "developing story", "exclusive", "alert"],
            ),
            topic_groups: default_topic_groups(),
            recency: RecencyRule::default(),
            length: LengthRule::default(),
        }
    }
}

fn default_topic_groups() -> Vec<LexiconGroup> {
    use Category::*;

    vec![
        // High-impact topics
        LexiconGroup::new(
            "politics",
            2.0,
            Some(GovernmentPolicy),
            &["election", "president", "congress", "senate", "white house", "campaign", "policy"],
        ),
        LexiconGroup::new(
            "government",
            2.0,
            Some(GovernmentPolicy),
            &[
                "government",
                "federal",
                "regulation",
                "supreme court",
                "legislation",
                "executive order",
                "bill passes",
                "signs bill",
                "lawmakers",
                "new law",
            ],
        ),
        LexiconGroup::new(
            "major_companies",
            1.5,
            None,
            &["apple", "google", "microsoft", "amazon", "meta", "tesla", "nvidia", "openai"],
        ),
        LexiconGroup::new(
            "financial_institutions",
            1.5,
            Some(Finance),
            &[
                "federal reserve",
                "fed ",
                "fed,",
                "fed.",
                "fed's",
                "fed:",
                "central bank",
                "jpmorgan",
                "goldman sachs",
                "treasury",
                "imf",
            ],
        ),
        LexiconGroup::new(
            "pharmaceuticals",
            1.5,
            Some(Health),
            &["pfizer", "moderna", "fda", "johnson & johnson", "drug approval", "pharmaceutical"],
        ),
        // Signal groups
        LexiconGroup::new(
            "market_moving",
            2.0,
            Some(Finance),
            &[
                "stock",
                "shares",
                "earnings",
                "interest rate",
                "rates",
                "merger",
                "acquisition",
                "ipo",
                "wall street",
            ],
        ),
        LexiconGroup::new(
            "technology",
            1.5,
            Some(Technology),
            &[
                "technology",
                "software",
                "hardware",
                "chip",
                "artificial intelligence",
                "semiconductor",
                "cyber",
                "smartphone",
            ],
        ),
        LexiconGroup::new(
            "health",
            1.5,
            Some(Health),
            &["health", "medicine", "medical", "disease", "hospital", "covid", "vaccine", "cancer"],
        ),
        LexiconGroup::new(
            "international",
            1.0,
            Some(World),
            &[
                "international",
                "global",
                "foreign",
                "united nations",
                "nato",
                "summit",
                "sanctions",
                "treaty",
            ],
        ),
        // Classification-only groups
        LexiconGroup::new(
            "economy",
            0.0,
            Some(Economy),
            &["economy", "economic", "inflation", "gdp", "unemployment", "jobs report", "recession", "tariff"],
        ),
        LexiconGroup::new(
            "space",
            0.0,
            Some(Space),
            &["nasa", "spacex", "rocket", "astronaut", "orbit", "satellite", "space station", "lunar"],
        ),
    ]
}
