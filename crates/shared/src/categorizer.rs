use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

use crate::classifier::{ClassificationItem, Classifier, ClassifyError, Label};
use crate::models::{Article, Category};
use crate::rules::RuleSet;

pub const DEFAULT_FALLBACK_CATEGORY: Category = Category::GovernmentPolicy;
pub const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Where an article's category came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Model,
    Keywords,
    Default,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorizeStats {
    pub labeled_by_model: usize,
    pub labeled_by_keywords: usize,
    pub labeled_by_default: usize,
    pub classifier_error: Option<String>,
}

impl CategorizeStats {
    fn record(&mut self, source: LabelSource) {
        match source {
            LabelSource::Model => self.labeled_by_model += 1,
            LabelSource::Keywords => self.labeled_by_keywords += 1,
            LabelSource::Default => self.labeled_by_default += 1,
        }
    }
}

/// Assigns one category to every article: model labels where the service
/// answered with a valid one, keyword matching everywhere else.
pub struct Categorizer {
    rules: RuleSet,
    fallback: Category,
    timeout: Duration,
}

impl Categorizer {
    pub fn new(rules: RuleSet, fallback: Category, timeout: Duration) -> Self {
        Self {
            rules,
            fallback,
            timeout,
        }
    }

    /// Deterministic classification from the category-tagged lexicon groups.
    ///
    /// The category with the most distinct matching terms in the title and
    /// description wins; ties go to the earlier category in canonical order.
    pub fn keyword_category(&self, article: &Article) -> (Category, LabelSource) {
        let text = article.headline_text();

        let mut best: Option<(Category, usize)> = None;
        for category in Category::ALL {
            let count: usize = self
                .rules
                .groups_for(category)
                .map(|group| group.match_count(&text))
                .sum();
            if count > 0 && best.map_or(true, |(_, top)| count > top) {
                best = Some((category, count));
            }
        }

        match best {
            Some((category, _)) => (category, LabelSource::Keywords),
            None => (self.fallback, LabelSource::Default),
        }
    }

    /// Apply the outcome of a classification call to the batch.
    ///
    /// Never fails: a failed call sends every article to keyword matching, and
    /// an article with a missing, unknown or conflicting label falls back on
    /// its own.
    pub fn apply_labels(
        &self,
        articles: &mut [Article],
        outcome: Result<Vec<Label>, ClassifyError>,
    ) -> CategorizeStats {
        let mut stats = CategorizeStats::default();

        let labels = match outcome {
            Ok(labels) => labels,
            Err(e) => {
                warn!("Classification failed: {}, using keyword fallback", e);
                stats.classifier_error = Some(e.to_string());
                Vec::new()
            }
        };

        // Repeats must agree; an index with conflicting answers gets None
        let mut by_index: HashMap<usize, Option<Category>> = HashMap::new();
        for label in &labels {
            let parsed = Category::from_label(&label.category);
            by_index
                .entry(label.index)
                .and_modify(|existing| {
                    if *existing != parsed {
                        *existing = None;
                    }
                })
                .or_insert(parsed);
        }

        for (index, article) in articles.iter_mut().enumerate() {
            let (category, source) = match by_index.get(&index).copied().flatten() {
                Some(category) => (category, LabelSource::Model),
                None => self.keyword_category(article),
            };
            article.category = Some(category);
            stats.record(source);
        }

        if stats.classifier_error.is_none() && stats.labeled_by_model < articles.len() {
            warn!(
                "Classification left {} of {} articles without a valid label",
                articles.len() - stats.labeled_by_model,
                articles.len()
            );
        }

        stats
    }

    /// Categorize the batch with one bounded call to `classifier`, or with
    /// keywords alone when no classifier is configured.
    pub async fn categorize(
        &self,
        articles: &mut [Article],
        classifier: Option<&dyn Classifier>,
    ) -> CategorizeStats {
        if articles.is_empty() {
            return CategorizeStats::default();
        }

        let Some(classifier) = classifier else {
            let mut stats = CategorizeStats::default();
            for article in articles.iter_mut() {
                let (category, source) = self.keyword_category(article);
                article.category = Some(category);
                stats.record(source);
            }
            return stats;
        };

        let items = ClassificationItem::from_articles(articles);
        info!("Classifying {} articles", items.len());

        let outcome = tokio::time::timeout(self.timeout, classifier.classify(&items))
            .await
            .unwrap_or(Err(ClassifyError::Timeout(self.timeout)));

        self.apply_labels(articles, outcome)
    }
}
