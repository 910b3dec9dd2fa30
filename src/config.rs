use crate::filter::UrlFilterConfig;
use crate::renderer::RenderOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid link pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Configuration for a harvesting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Pages to render and scan for documents
    #[serde(default = "default_seeds")]
    pub seeds: Vec<String>,

    /// Directory the documents are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Case-insensitive substring identifying document links
    #[serde(default = "default_marker")]
    pub marker: String,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// chromedriver binary to spawn per page instead of using `webdriver_url`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chromedriver_path: Option<PathBuf>,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Wait after navigation before capturing the page, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Ceiling on a whole browser session, in seconds
    #[serde(default = "default_session_timeout_secs")]
    pub session_timeout_secs: u64,

    /// Timeout for each document download, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Regex patterns a document URL must match (any of)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns that reject a document URL
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

/// Default seed pages
fn default_seeds() -> Vec<String> {
    vec!["https://radiomasterrc.com/pages/user-manuals".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("PDFs")
}

fn default_marker() -> String {
    crate::parsers::DEFAULT_MARKER.to_string()
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_settle_ms() -> u64 {
    3_000
}

/// Five minutes
fn default_session_timeout_secs() -> u64 {
    300
}

/// Fifteen minutes, enough for large documents on slow links
fn default_request_timeout_secs() -> u64 {
    900
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            seeds: default_seeds(),
            output_dir: default_output_dir(),
            marker: default_marker(),
            webdriver_url: default_webdriver_url(),
            chromedriver_path: None,
            headless: default_headless(),
            settle_ms: default_settle_ms(),
            session_timeout_secs: default_session_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
        }
    }
}

impl HarvestConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Override the WebDriver URL with `WEBDRIVER_URL` if it is set
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            webdriver_url: self.webdriver_url.clone(),
            chromedriver_path: self.chromedriver_path.clone(),
            headless: self.headless,
            settle_interval: Duration::from_millis(self.settle_ms),
            session_timeout: Duration::from_secs(self.session_timeout_secs),
        }
    }

    pub fn filter_config(&self) -> UrlFilterConfig {
        UrlFilterConfig {
            include_patterns: self.include_patterns.clone(),
            exclude_patterns: self.exclude_patterns.clone(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
