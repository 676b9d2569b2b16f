use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod config;
mod github;
mod widget;

use config::Config;
use widget::{
    ComparisonMode, HtmlPage, MemoryView, Notice, NoticeRenderer, OutputFormat, ReleaseSource,
    VersionCheckWidget, VersionTag,
};

#[derive(Parser)]
#[command(name = "gitblit-version-check")]
#[command(about = "Check a GitBlit plugin documentation page against the published releases")]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// GitHub token (can also be set via GITHUB_TOKEN env var)
    #[arg(long, env = "GITHUB_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Owner of the plugin repository
    #[arg(long, env = "GITHUB_OWNER", global = true)]
    owner: Option<String>,

    /// Plugin repository name
    #[arg(long, env = "GITHUB_REPO", global = true)]
    repo: Option<String>,

    /// Read releases from a saved JSONP response instead of GitHub
    #[arg(long, global = true)]
    jsonp: Option<PathBuf>,

    /// Compare version components as numbers instead of strings
    #[arg(long, global = true)]
    numeric: bool,

    /// Output format
    #[arg(short = 'f', long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a version tag and print the outcome
    Check {
        /// Version tag currently in use, e.g. v2.15.3.1
        #[arg(long)]
        current: String,
    },

    /// Replace the version-check trigger of an HTML page with the outcome
    Stamp {
        /// Documentation page to rewrite
        #[arg(short, long)]
        page: PathBuf,

        /// Output file path (rewrites the page if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show how a version tag is split
    Parse {
        tag: String,
    },

    /// List recent releases
    List {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

impl Cli {
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(owner) = &self.owner {
            config.github.owner = owner.clone();
        }
        if let Some(repo) = &self.repo {
            config.github.repo = repo.clone();
        }
        if self.numeric {
            config.check.comparison = ComparisonMode::Numeric;
        }

        Ok(config)
    }

    fn source(&self, config: &Config, limit: usize) -> Result<ReleaseSource> {
        if let Some(path) = &self.jsonp {
            return Ok(ReleaseSource::Jsonp {
                path: path.clone(),
                callback: config.check.callback.clone(),
            });
        }

        let client = github::GitHubClient::new(
            self.token.clone(),
            config.github.api_base.as_deref(),
            config.github.owner.clone(),
            config.github.repo.clone(),
        )?;
        Ok(ReleaseSource::GitHub { client, limit })
    }
}

/// Runs the check against an HTML page and writes the rewritten page to
/// `output`, or back to `page`. A page the widget cannot run on is left
/// untouched and yields `None`.
async fn stamp_page(
    page: &Path,
    output: Option<&Path>,
    config: &Config,
    source: &ReleaseSource,
) -> Result<Option<Notice>> {
    let html = tokio::fs::read_to_string(page).await?;
    let view = HtmlPage::new(html)?;

    let mut widget = match VersionCheckWidget::setup(view, &config.page, config.check.comparison) {
        Ok(widget) => widget,
        Err(e) => {
            tracing::warn!(page = %page.display(), "version check disabled: {}", e);
            return Ok(None);
        }
    };

    let notice = widget.click(source).await?;

    let target = output.unwrap_or(page);
    tokio::fs::write(target, widget.into_view().into_html()).await?;
    tracing::info!(page = %target.display(), "page updated");

    Ok(notice)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let renderer = NoticeRenderer::new()?;

    match &cli.command {
        Commands::Check { current } => {
            let view = MemoryView::default()
                .with_element(&config.page.trigger, "")
                .with_element(&config.page.current_version, current);

            let mut widget = VersionCheckWidget::setup(view, &config.page, config.check.comparison)?;
            let source = cli.source(&config, config.github.per_page)?;

            if let Some(notice) = widget.click(&source).await? {
                println!("{}", renderer.render(&notice, cli.format)?);
            }
        }
        Commands::Stamp { page, output } => {
            let source = cli.source(&config, config.github.per_page)?;
            if let Some(notice) = stamp_page(page, output.as_deref(), &config, &source).await? {
                println!("{}", renderer.render(&notice, cli.format)?);
            }
        }
        Commands::Parse { tag } => {
            let parsed: VersionTag = tag.parse()?;
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&parsed)?),
                _ => {
                    println!("gerrit:  {}", parsed.gerrit);
                    println!("gitblit: {}", parsed.gitblit);
                    println!("plugin:  {}", parsed.plugin);
                }
            }
        }
        Commands::List { limit } => {
            let source = cli.source(&config, *limit)?;
            let response = source.fetch().await;

            if !response.is_success() {
                anyhow::bail!(
                    "Could not retrieve releases (status: {})",
                    response.meta.status.map_or("none".to_string(), |s| s.to_string())
                );
            }

            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&response.data)?);
                return Ok(());
            }

            println!("Recent releases (limit: {}):", limit);
            println!();

            if response.data.is_empty() {
                println!("  No releases found");
            }
            for release in response.data.iter().take(*limit) {
                let mut flags = Vec::new();
                if release.draft {
                    flags.push("draft");
                }
                if release.prerelease {
                    flags.push("prerelease");
                }

                let date = release
                    .published_at
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                let flags = if flags.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", flags.join(", "))
                };

                println!("  - {}: {}{}  {}", release.tag_name, date, flags, release.html_url);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PAGE: &str = r##"<p>Version <span id="gerrit-gitblit-current-version">v2.15.3.1</span>
<a id="gerrit-gitblit-version-check" href="#" style="display: none">Check for updates</a></p>
"##;

    const RELEASES: &str = r#"pluginVersionCheck({"meta":{"status":200},"data":[
        {"tag_name":"v2.15.3.2","draft":false,"prerelease":false,
         "html_url":"https://github.com/o/r/releases/tag/v2.15.3.2"}]})"#;

    const STAMPED: &str = r#"<p>Version <span id="gerrit-gitblit-current-version">v2.15.3.1</span>
<a href="https://github.com/o/r/releases/tag/v2.15.3.2">A newer version v2.15.3.2 is available.</a></p>
"#;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn jsonp_source(file: &NamedTempFile) -> ReleaseSource {
        ReleaseSource::Jsonp {
            path: file.path().to_path_buf(),
            callback: config::types::DEFAULT_CALLBACK.to_string(),
        }
    }

    #[tokio::test]
    async fn stamp_rewrites_page_in_place() {
        let page = write_temp(PAGE);
        let releases = write_temp(RELEASES);

        let notice = stamp_page(page.path(), None, &Config::default(), &jsonp_source(&releases))
            .await
            .unwrap();

        assert!(matches!(notice, Some(Notice::NewerAvailable { .. })));
        assert_eq!(std::fs::read_to_string(page.path()).unwrap(), STAMPED);
    }

    #[tokio::test]
    async fn stamp_writes_to_output_and_keeps_page() {
        let page = write_temp(PAGE);
        let releases = write_temp(RELEASES);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("stamped.html");

        stamp_page(page.path(), Some(output.as_path()), &Config::default(), &jsonp_source(&releases))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), STAMPED);
        assert_eq!(std::fs::read_to_string(page.path()).unwrap(), PAGE);
    }

    #[tokio::test]
    async fn stamp_leaves_page_without_trigger_untouched() {
        let html = r#"<p>Version <span id="gerrit-gitblit-current-version">v2.15.3.1</span></p>"#;
        let page = write_temp(html);
        let releases = write_temp(RELEASES);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("stamped.html");

        let notice = stamp_page(page.path(), Some(output.as_path()), &Config::default(), &jsonp_source(&releases))
            .await
            .unwrap();

        assert_eq!(notice, None);
        assert_eq!(std::fs::read_to_string(page.path()).unwrap(), html);
        assert!(!output.exists());
    }

    #[test]
    fn flags_override_config_file() {
        let file = write_temp(
            r#"
            [github]
            owner = "file-owner"
            repo = "file-repo"
            per_page = 5
            "#,
        );
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from([
            "gitblit-version-check",
            "--config",
            path,
            "--owner",
            "flag-owner",
            "--numeric",
            "parse",
            "v2.15.3.1",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.github.owner, "flag-owner");
        assert_eq!(config.github.repo, "file-repo");
        assert_eq!(config.github.per_page, 5);
        assert_eq!(config.check.comparison, ComparisonMode::Numeric);
        assert_eq!(config.check.callback, config::types::DEFAULT_CALLBACK);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let file = write_temp("[check]\ncomparison = \"numeric\"\n");
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from(["gitblit-version-check", "parse", "v1.2.3", "--config", path]).unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.check.comparison, ComparisonMode::Numeric);
        assert_eq!(config.github.per_page, Config::default().github.per_page);
    }

    #[test]
    fn defaults_without_config_file() {
        let cli = Cli::try_parse_from(["gitblit-version-check", "parse", "v1.2.3"]).unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.check.comparison, ComparisonMode::Lexicographic);
        assert_eq!(config.page, widget::ElementIds::default());
    }
}
