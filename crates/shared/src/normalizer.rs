use sha2::{Digest as _, Sha256};
use tracing::warn;

use crate::dedup::canonical_title;
use crate::models::{Article, PublishedAt, RawArticle};

/// Stable identity for an article: source plus canonical title.
pub fn article_id(source: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.trim().to_lowercase().as_bytes());
    hasher.update([0x1f]);
    hasher.update(canonical_title(title).as_bytes());
    hasher
        .finalize()
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Canonicalize one raw record. Returns `None` when the title is missing or
/// blank; every other field falls back to a default.
pub fn normalize(raw: RawArticle) -> Option<Article> {
    let title = raw.title.as_deref().map(str::trim).unwrap_or("");
    if title.is_empty() {
        warn!(url = raw.url.as_deref().unwrap_or(""), "Skipping article without a title");
        return None;
    }

    let text = |field: Option<String>| field.map(|s| s.trim().to_string()).unwrap_or_default();

    let source = raw
        .source
        .as_ref()
        .and_then(|s| s.name())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    Some(Article {
        id: article_id(&source, title),
        title: title.to_string(),
        description: text(raw.description),
        content: text(raw.content),
        published_at: PublishedAt::parse(raw.published_at.as_deref()),
        url: text(raw.url),
        source,
        score: None,
        category: None,
    })
}

/// Normalize a batch in input order. Returns the articles and the number of
/// records that were skipped.
pub fn normalize_batch(raw: Vec<RawArticle>) -> (Vec<Article>, usize) {
    let received = raw.len();
    let articles: Vec<Article> = raw.into_iter().filter_map(normalize).collect();
    let skipped = received - articles.len();
    (articles, skipped)
}
