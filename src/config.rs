use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::model::Category;
use crate::parser::normalize::MentionPolicy;

pub const DEFAULT_CONFIG_FILE: &str = "profmats.toml";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub user_agent: String,
    /// Minimum delay between two requests, in seconds.
    pub rate_limit_secs: f64,
    /// Pause between two professions, in seconds.
    pub profession_delay_secs: f64,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub concurrency: usize,
    pub output_dir: PathBuf,
    pub duplicates: MentionPolicy,
    /// Per-profession guide URL overrides: `urls.<profession>.<expansion>`.
    #[serde(default)]
    pub urls: HashMap<String, HashMap<String, String>>,
    #[serde(default)]
    pub tiers: HashMap<String, u8>,
    #[serde(default)]
    pub categories: HashMap<String, Category>,
}

/// Built-in defaults, then the settings file (optional unless given
/// explicitly), then `PROFMATS_*` environment variables.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let settings = Config::builder()
        .set_default("base_url", "https://www.wow-professions.com")?
        .set_default("user_agent", DEFAULT_USER_AGENT)?
        .set_default("rate_limit_secs", 2.0)?
        .set_default("profession_delay_secs", 5.0)?
        .set_default("timeout_secs", 30)?
        .set_default("max_retries", 3)?
        .set_default("concurrency", 4)?
        .set_default("output_dir", "auctionator-shopping-lists")?
        .set_default("duplicates", "sum")?
        .add_source(file)
        .add_source(Environment::with_prefix("PROFMATS"))
        .build()
        .context("Failed to read settings")?;

    settings
        .try_deserialize()
        .context("Invalid settings")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let settings = load(None).unwrap();
        assert_eq!(settings.base_url, "https://www.wow-professions.com");
        assert_eq!(settings.rate_limit_secs, 2.0);
        assert_eq!(settings.profession_delay_secs, 5.0);
        assert_eq!(settings.concurrency, 4);
        assert_eq!(settings.duplicates, MentionPolicy::Sum);
        assert!(settings.urls.is_empty());
    }

    #[test]
    fn file_overrides_defaults() {
        let settings = load(Some(Path::new("tests/fixtures/profmats.toml"))).unwrap();
        assert_eq!(settings.duplicates, MentionPolicy::FirstMention);
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.tiers.get("star ruby").copied(), Some(1));
        assert_eq!(settings.categories.get("green dye").copied(), Some(Category::Pigment));
        assert_eq!(
            settings.urls["alchemy"]["vanilla"],
            "https://example.test/guides/classic-alchemy"
        );
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        assert!(load(Some(Path::new("tests/fixtures/does-not-exist.toml"))).is_err());
    }
}
