use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use shared::{
    newsapi::DEFAULT_SOURCES, Category, ClaudeClassifier, Classifier, Config, Digest,
    NewsApiClient, Pipeline, PipelineSettings, RawArticle,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "daily-digest")]
#[command(about = "Rank and categorize today's news articles for the daily digest")]
struct Args {
    /// JSON file of raw articles (array or NewsAPI response); fetches from NewsAPI when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Number of hours to look back when fetching
    #[arg(long, default_value = "24")]
    hours: i64,

    /// Number of articles to keep (overrides the settings file)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// JSON settings file with rule tables and tunables
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Skip the AI classification call and categorize by keywords only
    #[arg(long)]
    keyword_only: bool,

    /// Output file name or path for the digest JSON
    #[arg(short, long)]
    output: Option<String>,
}

/// Start of the fetch window, `hours` before `now`.
fn lookback_start(now: DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>> {
    if hours <= 0 {
        anyhow::bail!("--hours must be positive, got {}", hours);
    }
    Duration::try_hours(hours)
        .and_then(|window| now.checked_sub_signed(window))
        .with_context(|| format!("--hours is out of range: {}", hours))
}

async fn collect_articles(args: &Args, config: &Config) -> Result<Vec<RawArticle>> {
    if let Some(path) = &args.input {
        println!("\n📂 Loading articles from {}...", path.display());
        return shared::load_raw_articles(path);
    }

    let since = lookback_start(Utc::now(), args.hours)?;

    println!("\n🔍 Fetching articles from NewsAPI...");
    let client = NewsApiClient::new(config.newsapi_key()?.to_string())?;
    client
        .fetch_articles(DEFAULT_SOURCES, since)
        .await
        .context("Failed to fetch articles")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shared=info,daily_digest=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let mut settings = match &args.rules {
        Some(path) => PipelineSettings::load(path)?,
        None => PipelineSettings::default(),
    };
    if let Some(top_k) = args.top_k {
        settings.top_k = top_k;
    }

    println!("📰 Daily News Digest");

    let raw = collect_articles(&args, &config).await?;
    if raw.is_empty() {
        println!("No articles found. Check your API key, input file and network connection.");
        return Ok(());
    }
    println!("✓ Collected {} articles", raw.len());

    let classifier = match (&config.anthropic_api_key, args.keyword_only) {
        (Some(key), false) => Some(ClaudeClassifier::new(
            key.clone(),
            settings.model.clone(),
            settings.classify_timeout(),
        )?),
        (None, false) => {
            println!("⚠ ANTHROPIC_API_KEY not set, categorizing by keywords only");
            None
        }
        (_, true) => None,
    };

    println!("\n🎯 Ranking and categorizing articles...");
    let pipeline = Pipeline::new(&settings);
    let output = pipeline
        .run(
            raw,
            classifier.as_ref().map(|c| c as &dyn Classifier),
            Utc::now(),
        )
        .await;

    let stats = &output.stats;
    println!(
        "✓ Kept {} of {} articles ({} without a title, {} duplicates)",
        stats.selected, stats.received, stats.skipped, stats.duplicates
    );
    if let Some(error) = &stats.categorize.classifier_error {
        println!("⚠ AI categorization unavailable ({}), used keyword fallback", error);
    }

    println!("\n📊 Category Distribution:");
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    for article in &output.articles {
        if let Some(category) = article.category {
            *counts.entry(category).or_default() += 1;
        }
    }
    for (category, count) in &counts {
        println!("  {}: {} articles", category, count);
    }

    println!("\n📝 Top Articles:");
    for (i, article) in output.articles.iter().take(5).enumerate() {
        println!(
            "  {}. [{}] {} ({:.1})",
            i + 1,
            article.category.map(|c| c.label()).unwrap_or("-"),
            article.title,
            article.score_or_zero()
        );
        if !article.source.is_empty() {
            println!("     Source: {}", article.source);
        }
    }

    let filename = args
        .output
        .clone()
        .unwrap_or_else(|| format!("digest-{}.json", Utc::now().format("%Y-%m-%d")));
    let digest = Digest::new(output.stats, output.articles);
    let filepath = shared::save_digest(&digest, &filename).context("Failed to save digest")?;

    println!("\n✅ Digest saved to: {}", filepath.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_lookback_start() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        let since = lookback_start(now, 24).unwrap();
        assert_eq!(since, Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_lookback_start_rejects_out_of_range_hours() {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap();
        assert!(lookback_start(now, i64::MAX).is_err());
        assert!(lookback_start(now, 1_000_000_000_000).is_err());
        assert!(lookback_start(now, 0).is_err());
    }
}
