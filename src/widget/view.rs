use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use thiserror::Error;
use super::notice::{Notice, NoticeRenderer};

static OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<([a-z][a-z0-9]*)\b([^>]*)>").expect("open tag pattern"));
static ID_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("id attribute pattern")
});
static CLOSE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)</([a-z][a-z0-9]*)\s*>").expect("close tag pattern"));
static MARKUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup pattern"));
static HIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)display\s*:\s*none\s*;?\s*").expect("display pattern"));
static EMPTY_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\s+style\s*=\s*(?:""|'')"#).expect("empty style pattern"));

#[derive(Debug, Error)]
pub enum PageError {
    #[error("element `{id}` has no closing </{tag}>")]
    Unclosed { id: String, tag: String },
    #[error("no element with id `{0}`")]
    NotFound(String),
}

/// The small region of a document the widget reads and rewrites.
pub trait VersionView {
    fn has_element(&self, id: &str) -> bool;

    fn text_content(&self, id: &str) -> Option<String>;

    /// Makes a hidden element visible.
    fn show(&mut self, id: &str) -> Result<()>;

    /// Puts the notice where the element was and removes the element.
    fn replace_with_notice(&mut self, id: &str, notice: &Notice) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ElementSpan {
    tag: String,
    open: Range<usize>,
    inner: Range<usize>,
    outer: Range<usize>,
}

/// An HTML documentation page held as text. Elements are located by their
/// `id` attribute; nested elements of the same tag name are not supported.
pub struct HtmlPage {
    html: String,
    renderer: NoticeRenderer,
}

impl HtmlPage {
    pub fn new(html: String) -> Result<Self> {
        Ok(Self {
            html,
            renderer: NoticeRenderer::new()?,
        })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn into_html(self) -> String {
        self.html
    }

    fn find(&self, id: &str) -> Result<Option<ElementSpan>, PageError> {
        let Some(cap) = OPEN_TAG.captures_iter(&self.html).find(|cap| {
            let attrs = cap.get(2).map_or("", |m| m.as_str());
            ID_ATTR
                .captures(attrs)
                .and_then(|id_cap| id_cap.get(1).or_else(|| id_cap.get(2)))
                .is_some_and(|value| value.as_str() == id)
        }) else {
            return Ok(None);
        };
        let open = cap.get(0).map(|m| m.range()).unwrap_or_default();
        let tag = cap.get(1).map(|m| m.as_str().to_lowercase()).unwrap_or_default();

        let close = CLOSE_TAG
            .captures_iter(&self.html[open.end..])
            .find(|c| c.get(1).is_some_and(|name| name.as_str().eq_ignore_ascii_case(&tag)))
            .and_then(|c| c.get(0))
            .map(|m| (open.end + m.start())..(open.end + m.end()))
            .ok_or_else(|| PageError::Unclosed {
                id: id.to_string(),
                tag: tag.clone(),
            })?;

        Ok(Some(ElementSpan {
            tag,
            inner: open.end..close.start,
            outer: open.start..close.end,
            open,
        }))
    }

    fn require(&self, id: &str) -> Result<ElementSpan> {
        Ok(self.find(id)?.ok_or_else(|| PageError::NotFound(id.to_string()))?)
    }
}

impl VersionView for HtmlPage {
    fn has_element(&self, id: &str) -> bool {
        matches!(self.find(id), Ok(Some(_)))
    }

    fn text_content(&self, id: &str) -> Option<String> {
        let span = self.find(id).ok()??;
        let text = MARKUP.replace_all(&self.html[span.inner], "");
        Some(text.trim().to_string())
    }

    fn show(&mut self, id: &str) -> Result<()> {
        let span = self.require(id)?;

        let open_tag = &self.html[span.open.clone()];
        let shown = HIDDEN.replace_all(open_tag, "");
        let visible = EMPTY_STYLE.replace_all(&shown, "").into_owned();
        self.html.replace_range(span.open, &visible);

        tracing::debug!(id, tag = %span.tag, "trigger made visible");
        Ok(())
    }

    fn replace_with_notice(&mut self, id: &str, notice: &Notice) -> Result<()> {
        let span = self.require(id)?;
        let fragment = self.renderer.fragment(notice)?;
        self.html.replace_range(span.outer, &fragment);
        Ok(())
    }
}

/// A view with no document behind it, for terminal output and tests.
#[derive(Debug, Default)]
pub struct MemoryView {
    elements: HashMap<String, String>,
    visible: Vec<String>,
    notices: Vec<(String, Notice)>,
}

impl MemoryView {
    pub fn with_element(mut self, id: &str, text: &str) -> Self {
        self.elements.insert(id.to_string(), text.to_string());
        self
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.visible.iter().any(|v| v == id)
    }

    /// Notices rendered so far, in order.
    pub fn notices(&self) -> &[(String, Notice)] {
        &self.notices
    }
}

impl VersionView for MemoryView {
    fn has_element(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn text_content(&self, id: &str) -> Option<String> {
        self.elements.get(id).cloned()
    }

    fn show(&mut self, id: &str) -> Result<()> {
        if !self.elements.contains_key(id) {
            return Err(PageError::NotFound(id.to_string()).into());
        }
        self.visible.push(id.to_string());
        Ok(())
    }

    fn replace_with_notice(&mut self, id: &str, notice: &Notice) -> Result<()> {
        self.elements
            .remove(id)
            .ok_or_else(|| PageError::NotFound(id.to_string()))?;
        self.visible.retain(|v| v != id);
        self.notices.push((id.to_string(), notice.clone()));
        Ok(())
    }
}
