use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{Digest, RawArticle};

/// Get the default directory for storing digest files
pub fn get_default_digest_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .context("Could not determine local data directory")?
        .join("daily-digest")
        .join("digests");

    fs::create_dir_all(&data_dir).context("Failed to create digests directory")?;

    Ok(data_dir)
}

/// Save a digest as pretty JSON. Bare file names land in the default digest
/// directory; anything with a directory component is used as given.
pub fn save_digest(data: &Digest, filename: &str) -> Result<PathBuf> {
    let path = Path::new(filename);
    let filepath = if path.parent().map_or(true, |p| p.as_os_str().is_empty()) {
        get_default_digest_dir()?.join(filename)
    } else {
        path.to_path_buf()
    };

    let json = serde_json::to_string_pretty(data).context("Failed to serialize digest")?;

    fs::write(&filepath, json)
        .with_context(|| format!("Failed to write digest file: {}", filepath.display()))?;

    Ok(filepath)
}

/// Load a digest written by `save_digest`
pub fn load_digest(filepath: &Path) -> Result<Digest> {
    if !filepath.exists() {
        anyhow::bail!("Digest file not found: {}", filepath.display());
    }

    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read digest file: {}", filepath.display()))?;

    let data: Digest = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse digest JSON from {}. The file may be corrupted or not a valid digest file.",
            filepath.display()
        )
    })?;

    if data.version != "1.0" {
        anyhow::bail!(
            "Unsupported digest file version: {}. Expected 1.0.",
            data.version
        );
    }

    Ok(data)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBatch {
    List(Vec<RawArticle>),
    NewsApi { articles: Vec<RawArticle> },
}

/// Load raw articles handed over by a fetcher: either a JSON array of
/// records or a saved NewsAPI response.
pub fn load_raw_articles(filepath: &Path) -> Result<Vec<RawArticle>> {
    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read articles file: {}", filepath.display()))?;

    let batch: RawBatch = serde_json::from_str(&content).with_context(|| {
        format!(
            "Failed to parse articles from {}. Expected a JSON array or an object with an \"articles\" array.",
            filepath.display()
        )
    })?;

    Ok(match batch {
        RawBatch::List(articles) => articles,
        RawBatch::NewsApi { articles } => articles,
    })
}
