pub mod notice;
pub mod source;
pub mod version_tag;
pub mod view;

pub use notice::{Notice, NoticeRenderer, OutputFormat};
pub use source::ReleaseSource;
pub use version_tag::{ComparisonMode, VersionError, VersionTag};
pub use view::{HtmlPage, MemoryView, VersionView};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use crate::github::ReleaseListResponse;

pub const TRIGGER_ID: &str = "gerrit-gitblit-version-check";
pub const CURRENT_VERSION_ID: &str = "gerrit-gitblit-current-version";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementIds {
    pub trigger: String,
    pub current_version: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        Self {
            trigger: TRIGGER_ID.to_string(),
            current_version: CURRENT_VERSION_ID.to_string(),
        }
    }
}

/// Reasons the widget stays disabled.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("required element `{0}` is missing")]
    MissingElement(String),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error("failed to reveal trigger: {0}")]
    View(#[source] anyhow::Error),
}

/// Compares the version shown in a view with the published releases and
/// swaps the trigger for the outcome.
pub struct VersionCheckWidget<V> {
    view: V,
    current: VersionTag,
    mode: ComparisonMode,
    /// Cleared once a notice has been rendered.
    trigger: Option<String>,
}

impl<V: VersionView> VersionCheckWidget<V> {
    pub fn setup(mut view: V, ids: &ElementIds, mode: ComparisonMode) -> Result<Self, SetupError> {
        for id in [&ids.trigger, &ids.current_version] {
            if !view.has_element(id) {
                return Err(SetupError::MissingElement(id.clone()));
            }
        }

        let text = view
            .text_content(&ids.current_version)
            .ok_or_else(|| SetupError::MissingElement(ids.current_version.clone()))?;
        let current: VersionTag = text.parse()?;

        view.show(&ids.trigger).map_err(SetupError::View)?;

        tracing::debug!(%current, ?mode, "version check ready");

        Ok(Self {
            view,
            current,
            mode,
            trigger: Some(ids.trigger.clone()),
        })
    }

    pub fn current(&self) -> &VersionTag {
        &self.current
    }

    pub fn is_done(&self) -> bool {
        self.trigger.is_none()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Fetches the release list and renders the outcome. Does nothing once
    /// the trigger is gone.
    pub async fn click(&mut self, source: &ReleaseSource) -> Result<Option<Notice>> {
        if self.is_done() {
            tracing::debug!("trigger already replaced, ignoring click");
            return Ok(None);
        }

        let response = source.fetch().await;
        self.handle_response(Some(&response))
    }

    /// Renders the notice for a response. `None` stands for a response that
    /// never arrived or could not be read.
    pub fn handle_response(&mut self, response: Option<&ReleaseListResponse>) -> Result<Option<Notice>> {
        let Some(trigger) = self.trigger.as_deref() else {
            return Ok(None);
        };

        let notice = self.select(response);
        self.view.replace_with_notice(trigger, &notice)?;

        tracing::info!(current = %self.current, ?notice, "version check finished");
        self.trigger = None;

        Ok(Some(notice))
    }

    fn select(&self, response: Option<&ReleaseListResponse>) -> Notice {
        let Some(response) = response.filter(|r| r.is_success()) else {
            return Notice::Unavailable;
        };

        for release in response.data.iter().filter(|r| r.is_published()) {
            let candidate = match release.tag_name.parse::<VersionTag>() {
                Ok(tag) => tag,
                Err(e) => {
                    tracing::debug!("skipping release: {}", e);
                    continue;
                }
            };

            if candidate.is_newer_than(&self.current, self.mode) {
                return Notice::NewerAvailable {
                    tag: release.tag_name.clone(),
                    url: release.html_url.clone(),
                };
            }
        }

        Notice::UpToDate
    }
}
