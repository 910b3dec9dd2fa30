use clap::Parser;
use pdf_harvest::HarvestConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdf-harvest")]
#[command(about = "Render pages in a real browser and download the PDFs they link to")]
#[command(version)]
pub struct Args {
    /// Pages to scan (defaults to the configured seed list)
    pub seeds: Vec<String>,

    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory documents are written into
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Case-insensitive substring identifying document links
    #[arg(short, long)]
    pub marker: Option<String>,

    /// WebDriver server URL (also read from WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// chromedriver binary to spawn per page instead of using a running server
    #[arg(long)]
    pub chromedriver: Option<PathBuf>,

    /// Wait after navigation before capturing, in milliseconds
    #[arg(long)]
    pub settle_ms: Option<u64>,

    /// Ceiling on a whole browser session, in seconds
    #[arg(long)]
    pub session_timeout: Option<u64>,

    /// Timeout for each document download, in seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply(self, config: &mut HarvestConfig) {
        if !self.seeds.is_empty() {
            config.seeds = self.seeds;
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(marker) = self.marker {
            config.marker = marker;
        }
        if let Some(url) = self.webdriver_url {
            config.webdriver_url = url;
        }
        if let Some(path) = self.chromedriver {
            config.chromedriver_path = Some(path);
        }
        if let Some(ms) = self.settle_ms {
            config.settle_ms = ms;
        }
        if let Some(secs) = self.session_timeout {
            config.session_timeout_secs = secs;
        }
        if let Some(secs) = self.request_timeout {
            config.request_timeout_secs = secs;
        }
        if self.headed {
            config.headless = false;
        }
    }
}
