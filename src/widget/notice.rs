use anyhow::Result;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const UP_TO_DATE_TEXT: &str = "This is the current plugin version for this Gerrit version.";
pub const UNAVAILABLE_TEXT: &str = "Could not retrieve update information from GitHub.";

/// What replaces the trigger once a check has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Notice {
    NewerAvailable { tag: String, url: String },
    UpToDate,
    Unavailable,
}

impl Notice {
    pub fn text(&self) -> String {
        match self {
            Notice::NewerAvailable { tag, .. } => format!("A newer version {} is available.", tag),
            Notice::UpToDate => UP_TO_DATE_TEXT.to_string(),
            Notice::Unavailable => UNAVAILABLE_TEXT.to_string(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Notice::NewerAvailable { url, .. } => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
    Html,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            "html" => Ok(OutputFormat::Html),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

pub struct NoticeRenderer {
    template_engine: Handlebars<'static>,
}

impl NoticeRenderer {
    pub fn new() -> Result<Self> {
        let mut template_engine = Handlebars::new();
        template_engine.register_template_string(
            "fragment",
            include_str!("../../templates/notice.html.hbs"),
        )?;

        Ok(Self { template_engine })
    }

    /// The HTML that takes the trigger element's place in a page. Text and
    /// URL are escaped by handlebars.
    pub fn fragment(&self, notice: &Notice) -> Result<String> {
        let data = json!({
            "text": notice.text(),
            "url": notice.url(),
        });
        Ok(self.template_engine.render("fragment", &data)?.trim_end().to_string())
    }

    pub fn render(&self, notice: &Notice, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(match notice.url() {
                Some(url) => format!("{} {}", notice.text(), url),
                None => notice.text(),
            }),
            OutputFormat::Markdown => Ok(Self::markdown(notice)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(notice)?),
            OutputFormat::Html => {
                let markdown = Self::markdown(notice);
                let parser = pulldown_cmark::Parser::new(&markdown);
                let mut html = String::new();
                pulldown_cmark::html::push_html(&mut html, parser);
                Ok(html.trim_end().to_string())
            }
        }
    }

    fn markdown(notice: &Notice) -> String {
        match notice.url() {
            Some(url) => format!("[{}](<{}>)", notice.text(), url),
            None => notice.text(),
        }
    }
}
