use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Status code the release list must carry to be trusted.
pub const STATUS_OK: u16 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseEntry {
    pub tag_name: String,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub prerelease: bool,
    pub html_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl ReleaseEntry {
    pub fn is_published(&self) -> bool {
        !self.draft && !self.prerelease
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Absent when the request failed before any HTTP status was seen.
    #[serde(default)]
    pub status: Option<u16>,
}

/// The release list envelope, in the shape GitHub hands to JSONP callbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReleaseListResponse {
    #[serde(default)]
    pub meta: ResponseMeta,
    #[serde(default)]
    pub data: Vec<ReleaseEntry>,
}

impl ReleaseListResponse {
    pub fn ok(data: Vec<ReleaseEntry>) -> Self {
        Self {
            meta: ResponseMeta {
                status: Some(STATUS_OK),
            },
            data,
        }
    }

    pub fn failed(status: Option<u16>) -> Self {
        Self {
            meta: ResponseMeta { status },
            data: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.meta.status == Some(STATUS_OK)
    }

    /// Unwraps a padded JSON body such as `pluginVersionCheck({...});`.
    pub fn from_jsonp(body: &str, callback: &str) -> Result<Self> {
        let pattern = format!(r"(?s)^\s*(?:/\*\*/\s*)?{}\s*\((.*)\)\s*;?\s*$", regex::escape(callback));
        let re = Regex::new(&pattern)?;

        let payload = re
            .captures(body)
            .and_then(|cap| cap.get(1))
            .ok_or_else(|| anyhow!("Body is not a JSONP call to `{}`", callback))?;

        serde_json::from_str(payload.as_str()).context("Failed to parse JSONP payload")
    }
}
