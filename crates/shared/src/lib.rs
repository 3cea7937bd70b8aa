// Public modules
pub mod categorizer;
pub mod classifier;
pub mod config;
pub mod dedup;
pub mod io;
pub mod models;
pub mod newsapi;
pub mod normalizer;
pub mod pipeline;
pub mod rules;
pub mod scorer;
pub mod selector;

// Re-export commonly used types
pub use categorizer::{CategorizeStats, Categorizer};
pub use classifier::{ClaudeClassifier, Classifier, ClassifyError, Label};
pub use config::{Config, PipelineSettings};
pub use io::{get_default_digest_dir, load_digest, load_raw_articles, save_digest};
pub use models::{Article, Category, Digest, PublishedAt, RawArticle};
pub use newsapi::NewsApiClient;
pub use pipeline::{Pipeline, PipelineOutput, RunStats};
pub use rules::RuleSet;
pub use scorer::Scorer;
