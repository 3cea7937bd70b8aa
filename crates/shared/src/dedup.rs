use std::collections::HashSet;

use crate::models::Article;

/// Lower-case the title, drop punctuation and collapse whitespace.
pub fn canonical_title(title: &str) -> String {
    let stripped: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep the first article for each canonical title, in input order.
///
/// Only exact matches after canonicalization are merged; two headlines about
/// the same event worded differently both survive.
pub fn dedup(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| seen.insert(canonical_title(&article.title)))
        .collect()
}
