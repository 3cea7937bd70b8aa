use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::categorizer::{CategorizeStats, Categorizer};
use crate::classifier::Classifier;
use crate::config::PipelineSettings;
use crate::dedup::dedup;
use crate::models::{Article, RawArticle};
use crate::normalizer::normalize_batch;
use crate::scorer::Scorer;
use crate::selector::select_top;

/// Counts from one run, saved alongside the digest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub received: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub selected: usize,
    #[serde(flatten)]
    pub categorize: CategorizeStats,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub articles: Vec<Article>,
    pub stats: RunStats,
}

/// Normalize, dedup, score, select and categorize one batch, strictly in
/// that order.
pub struct Pipeline {
    scorer: Scorer,
    categorizer: Categorizer,
    top_k: usize,
}

impl Pipeline {
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            scorer: Scorer::new(settings.rules.clone()),
            categorizer: Categorizer::new(
                settings.rules.clone(),
                settings.fallback_category,
                settings.classify_timeout(),
            ),
            top_k: settings.top_k,
        }
    }

    pub async fn run(
        &self,
        raw: Vec<RawArticle>,
        classifier: Option<&dyn Classifier>,
        now: DateTime<Utc>,
    ) -> PipelineOutput {
        let mut stats = RunStats {
            received: raw.len(),
            ..Default::default()
        };

        let (articles, skipped) = normalize_batch(raw);
        stats.skipped = skipped;
        info!("Normalized {} articles ({} skipped)", articles.len(), skipped);

        let before_dedup = articles.len();
        let mut articles = dedup(articles);
        stats.duplicates = before_dedup - articles.len();
        info!(
            "{} unique articles after removing {} duplicates",
            articles.len(),
            stats.duplicates
        );

        self.scorer.score_all(&mut articles, now);

        let mut articles = select_top(articles, self.top_k);
        stats.selected = articles.len();
        info!("Selected top {} articles", articles.len());

        stats.categorize = self.categorizer.categorize(&mut articles, classifier).await;
        info!(
            model = stats.categorize.labeled_by_model,
            keywords = stats.categorize.labeled_by_keywords,
            default = stats.categorize.labeled_by_default,
            "Categorized articles"
        );

        PipelineOutput { articles, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassificationItem, ClassifyError, Label};
    use crate::models::{Category, RawSource};
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap()
    }

    fn raw(title: &str, source: &str, content_len: usize, hours_old: i64) -> RawArticle {
        RawArticle {
            title: Some(title.to_string()),
            description: None,
            content: Some("x".repeat(content_len)),
            source: Some(RawSource::Name(source.to_string())),
            published_at: Some((now() - Duration::hours(hours_old)).to_rfc3339()),
            url: Some(format!("https://example.com/{}", title.len())),
        }
    }

    fn settings(top_k: usize) -> PipelineSettings {
        PipelineSettings {
            top_k,
            ..Default::default()
        }
    }

    struct Unavailable;

    #[async_trait]
    impl Classifier for Unavailable {
        async fn classify(
            &self,
            _items: &[ClassificationItem],
        ) -> Result<Vec<Label>, ClassifyError> {
            Err(ClassifyError::Malformed("not json".to_string()))
        }
    }

    struct EchoTechnology;

    #[async_trait]
    impl Classifier for EchoTechnology {
        async fn classify(
            &self,
            items: &[ClassificationItem],
        ) -> Result<Vec<Label>, ClassifyError> {
            Ok(items
                .iter()
                .map(|item| Label {
                    index: item.index,
                    category: "Technology".to_string(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn test_fed_story_ranks_first_with_k_one() {
        let pipeline = Pipeline::new(&settings(1));
        let batch = vec![
            raw("Local bakery wins award", "Unknown Blog", 50, 72),
            raw("Fed raises rates amid inflation fears", "Reuters", 600, 2),
        ];

        let output = pipeline.run(batch, None, now()).await;

        assert_eq!(output.articles.len(), 1);
        assert_eq!(output.articles[0].title, "Fed raises rates amid inflation fears");
        assert_eq!(output.stats.selected, 1);
    }

    #[tokio::test]
    async fn test_run_counts_skips_and_duplicates() {
        let pipeline = Pipeline::new(&settings(25));
        let batch = vec![
            raw("Fed raises rates", "Reuters", 600, 2),
            RawArticle::default(),
            raw("FED raises rates!", "Bloomberg", 600, 1),
            raw("Apple unveils new chip", "CNBC", 300, 3),
        ];

        let output = pipeline.run(batch, Some(&EchoTechnology), now()).await;

        assert_eq!(output.stats.received, 4);
        assert_eq!(output.stats.skipped, 1);
        assert_eq!(output.stats.duplicates, 1);
        assert_eq!(output.stats.selected, 2);
        assert_eq!(output.stats.categorize.labeled_by_model, 2);
        assert!(output
            .articles
            .iter()
            .all(|a| a.category == Some(Category::Technology) && a.score.is_some()));
        assert_eq!(output.articles[0].source, "Reuters");
    }

    #[tokio::test]
    async fn test_failed_classifier_still_completes_run() {
        let pipeline = Pipeline::new(&settings(25));
        let batch = vec![
            raw("Hospital reports vaccine results", "NPR", 100, 1),
            raw("Local bakery wins award", "Unknown Blog", 50, 72),
        ];

        let output = pipeline.run(batch, Some(&Unavailable), now()).await;

        assert!(output.articles.iter().all(|a| a.category.is_some()));
        assert_eq!(output.articles[0].category, Some(Category::Health));
        assert_eq!(output.articles[1].category, Some(Category::GovernmentPolicy));
        assert!(output.stats.categorize.classifier_error.is_some());
    }

    #[tokio::test]
    async fn test_empty_batch_is_not_an_error() {
        let pipeline = Pipeline::new(&settings(25));
        let output = pipeline.run(Vec::new(), Some(&Unavailable), now()).await;

        assert!(output.articles.is_empty());
        assert_eq!(output.stats, RunStats::default());
    }

    #[tokio::test]
    async fn test_runs_are_reproducible() {
        let pipeline = Pipeline::new(&settings(25));
        let batch = vec![
            raw("Quiet day", "Reuters", 0, 30),
            raw("BREAKING: Apple unveils new AI chip", "CNBC", 250, 1),
            raw("Another quiet day", "Reuters", 0, 30),
            raw("Fed raises rates amid inflation fears", "Reuters", 600, 2),
        ];

        let first = pipeline.run(batch.clone(), None, now()).await;
        let second = pipeline.run(batch, None, now()).await;

        let summary = |o: &PipelineOutput| {
            o.articles
                .iter()
                .map(|a| (a.id.clone(), a.score, a.category))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&first), summary(&second));

        // Equal scores keep input order
        let titles: Vec<_> = first.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "BREAKING: Apple unveils new AI chip",
                "Fed raises rates amid inflation fears",
                "Quiet day",
                "Another quiet day"
            ]
        );
    }
}
