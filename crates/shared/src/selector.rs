use crate::models::Article;

pub const DEFAULT_TOP_K: usize = 25;

/// Highest scores first, keeping input order among equal scores, truncated to
/// `k` articles.
pub fn select_top(mut articles: Vec<Article>, k: usize) -> Vec<Article> {
    // sort_by is stable, so ties keep their post-dedup order
    articles.sort_by(|a, b| b.score_or_zero().total_cmp(&a.score_or_zero()));
    articles.truncate(k);
    articles
}
