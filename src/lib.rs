pub mod config;
pub mod driver;
pub mod fetcher;
pub mod filter;
pub mod parsers;
pub mod pipeline;
pub mod renderer;
pub mod results;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ConfigError, HarvestConfig};
pub use fetcher::{FetchError, Fetcher};
pub use pipeline::Harvester;
pub use renderer::{PageRenderer, RenderError, WebDriverRenderer};
pub use results::{DownloadOutcome, DownloadRecord, RenderedDocument, RunSummary};

use filter::UrlFilter;
use std::path::PathBuf;

/// Errors that stop a run before any page is processed
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Main builder for a harvesting run backed by a WebDriver browser
pub struct Harvest {
    config: HarvestConfig,
}

impl Harvest {
    /// Create a new builder from configuration
    pub fn new(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Replace the seed pages
    pub fn with_seeds(mut self, seeds: Vec<String>) -> Self {
        self.config.seeds = seeds;
        self
    }

    /// Set the directory documents are written into
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the substring identifying document links
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.config.marker = marker.into();
        self
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Assemble the pipeline from the configuration
    pub fn build(&self) -> Result<Harvester<WebDriverRenderer>, SetupError> {
        let renderer = WebDriverRenderer::new(self.config.render_options());
        let fetcher = Fetcher::new(&self.config.output_dir, self.config.request_timeout())?;
        let filter = UrlFilter::new(&self.config.filter_config()).map_err(ConfigError::from)?;

        Ok(Harvester::new(renderer, fetcher, filter).with_marker(self.config.marker.clone()))
    }

    /// Render every seed and download the documents it links to
    pub async fn run(self) -> Result<RunSummary, SetupError> {
        let harvester = self.build()?;
        Ok(harvester.run(self.config.seeds).await)
    }
}
