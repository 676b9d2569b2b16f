use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::widget::{ComparisonMode, ElementIds};

pub const DEFAULT_OWNER: &str = "tomaswolf";
pub const DEFAULT_REPO: &str = "gerrit-gitblit-plugin";
pub const DEFAULT_CALLBACK: &str = "pluginVersionCheck";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GithubConfig,
    pub page: ElementIds,
    pub check: CheckConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub owner: String,
    pub repo: String,
    /// Overrides `https://api.github.com`, e.g. for GitHub Enterprise.
    pub api_base: Option<String>,
    pub per_page: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    pub comparison: ComparisonMode,
    /// Callback name expected in saved JSONP responses.
    pub callback: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            api_base: None,
            per_page: 30,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            comparison: ComparisonMode::default(),
            callback: DEFAULT_CALLBACK.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }
}
