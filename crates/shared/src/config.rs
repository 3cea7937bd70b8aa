use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::categorizer::{DEFAULT_CLASSIFY_TIMEOUT, DEFAULT_FALLBACK_CATEGORY};
use crate::classifier::DEFAULT_MODEL;
use crate::models::Category;
use crate::rules::RuleSet;
use crate::selector::DEFAULT_TOP_K;

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    newsapi_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        Self {
            anthropic_api_key: non_empty_var("ANTHROPIC_API_KEY"),
            newsapi_key: non_empty_var("NEWSAPI_KEY"),
        }
    }

    /// Only needed when fetching; a run from an input file works without it.
    pub fn newsapi_key(&self) -> Result<&str> {
        self.newsapi_key.as_deref().context(
            "NEWSAPI_KEY not found.\n\n\
            To fix this, create ~/.config/daily-digest/.env with:\n  \
            NEWSAPI_KEY=your_key_here\n  \
            ANTHROPIC_API_KEY=your_key_here\n\n\
            Or pass --input with a JSON file of articles instead of fetching.",
        )
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/daily-digest/.env (standard config location)
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("daily-digest").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Tunables for one pipeline run. Every field has a default, so a settings
/// file only needs the values it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub fallback_category: Category,
    pub classify_timeout_secs: u64,
    pub model: String,
    pub rules: RuleSet,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            fallback_category: DEFAULT_FALLBACK_CATEGORY,
            classify_timeout_secs: DEFAULT_CLASSIFY_TIMEOUT.as_secs(),
            model: DEFAULT_MODEL.to_string(),
            rules: RuleSet::default(),
        }
    }
}

impl PipelineSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        let settings: PipelineSettings = serde_json::from_str(&content).with_context(|| {
            format!("Failed to parse settings JSON from {}", path.display())
        })?;

        if settings.classify_timeout_secs == 0 {
            anyhow::bail!("classify_timeout_secs must be greater than zero");
        }
        settings
            .rules
            .validate()
            .with_context(|| format!("Invalid rules in {}", path.display()))?;

        Ok(settings)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.top_k, 25);
        assert_eq!(settings.fallback_category, Category::GovernmentPolicy);
        assert_eq!(settings.classify_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_settings_file_overrides_some_fields() {
        let path = env::temp_dir().join(format!("digest-settings-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"top_k": 10, "fallback_category": "World", "rules": {"trusted_sources": ["ap"]}}"#,
        )
        .unwrap();

        let settings = PipelineSettings::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(settings.top_k, 10);
        assert_eq!(settings.fallback_category, Category::World);
        assert_eq!(settings.rules.trusted_sources, vec!["ap".to_string()]);
        assert_eq!(settings.rules.trusted_source_bonus, 3.0);
        assert_eq!(settings.classify_timeout_secs, 30);
    }

    #[test]
    fn test_settings_file_rejects_unknown_category() {
        let path = env::temp_dir().join(format!("digest-bad-{}.json", std::process::id()));
        fs::write(&path, r#"{"fallback_category": "Sports"}"#).unwrap();

        let result = PipelineSettings::load(&path);
        fs::remove_file(&path).unwrap();

        assert!(result.is_err());
    }

    #[test]
    fn test_settings_file_rejects_out_of_range_recency() {
        let path = env::temp_dir().join(format!("digest-hours-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{"rules": {"recency": {"fresh_hours": 9223372036854775807, "fresh_bonus": 2.0, "recent_hours": 12, "recent_bonus": 1.0}}}"#,
        )
        .unwrap();

        let result = PipelineSettings::load(&path);
        fs::remove_file(&path).unwrap();

        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("fresh_hours"), "{}", message);
    }
}
