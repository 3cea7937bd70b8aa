use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::models::{Article, PublishedAt};
use crate::rules::RuleSet;

/// One awarded bonus and the rule that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub signal: String,
    pub bonus: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScoreBreakdown {
    pub contributions: Vec<Contribution>,
}

impl ScoreBreakdown {
    fn add(&mut self, signal: &str, bonus: f64) {
        if bonus != 0.0 {
            self.contributions.push(Contribution {
                signal: signal.to_string(),
                bonus,
            });
        }
    }

    pub fn total(&self) -> f64 {
        self.contributions.iter().map(|c| c.bonus).sum()
    }

    pub fn has(&self, signal: &str) -> bool {
        self.contributions.iter().any(|c| c.signal == signal)
    }
}

/// Computes priority scores from a fixed rule set. Scores are uncapped sums
/// of independent bonuses and depend only on the article, the rules and the
/// reference time passed in.
pub struct Scorer {
    rules: RuleSet,
}

impl Scorer {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn breakdown(&self, article: &Article, now: DateTime<Utc>) -> ScoreBreakdown {
        let rules = &self.rules;
        let mut breakdown = ScoreBreakdown::default();

        let source = article.source.to_lowercase();
        if !source.is_empty()
            && rules
                .trusted_sources
                .iter()
                .any(|trusted| source.contains(&trusted.to_lowercase()))
        {
            breakdown.add("trusted_source", rules.trusted_source_bonus);
        }

        if rules.breaking.matches(&article.headline_text()) {
            breakdown.add(&rules.breaking.name, rules.breaking.weight);
        }

        let text = article.search_text();
        for group in &rules.topic_groups {
            if group.matches(&text) {
                breakdown.add(&group.name, group.weight);
            }
        }

        breakdown.add("recency", self.recency_bonus(article.published_at, now));
        breakdown.add("length", self.length_bonus(article));

        breakdown
    }

    pub fn score(&self, article: &Article, now: DateTime<Utc>) -> f64 {
        self.breakdown(article, now).total()
    }

    /// Score every article that has not been scored yet.
    pub fn score_all(&self, articles: &mut [Article], now: DateTime<Utc>) {
        for article in articles.iter_mut().filter(|a| a.score.is_none()) {
            let breakdown = self.breakdown(article, now);
            debug!(
                id = %article.id,
                score = breakdown.total(),
                signals = ?breakdown.contributions,
                "Scored article"
            );
            article.score = Some(breakdown.total());
        }
    }

    fn recency_bonus(&self, published_at: PublishedAt, now: DateTime<Utc>) -> f64 {
        let PublishedAt::Known(published) = published_at else {
            return 0.0;
        };
        let rule = &self.rules.recency;
        // Future timestamps count as brand new
        let age = (now - published).max(chrono::Duration::zero());

        // Windows that do not fit in a duration never match
        let within = |hours: i64| {
            chrono::Duration::try_hours(hours).is_some_and(|limit| age < limit)
        };

        if within(rule.fresh_hours) {
            rule.fresh_bonus
        } else if within(rule.recent_hours) {
            rule.recent_bonus
        } else {
            0.0
        }
    }

    fn length_bonus(&self, article: &Article) -> f64 {
        let rule = &self.rules.length;
        let length = article.description.chars().count() + article.content.chars().count();

        if length >= rule.long_chars {
            rule.long_bonus
        } else if length >= rule.medium_chars {
            rule.medium_bonus
        } else {
            0.0
        }
    }
}
