use clap::Parser;
use pdf_harvest::{Harvest, HarvestConfig};

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match HarvestConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                ::log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => HarvestConfig::default(),
    };
    config.apply_env();
    args.apply(&mut config);

    if config.chromedriver_path.is_none() {
        ::log::info!(
            "Using WebDriver at {} (set WEBDRIVER_URL or --chromedriver to change)",
            config.webdriver_url
        );
    }

    match Harvest::new(config).run().await {
        Ok(summary) => {
            ::log::info!(
                "Finished: {} new documents, {} already present",
                summary.downloaded,
                summary.skipped
            );
        }
        Err(e) => {
            ::log::error!("Failed to start harvest: {}", e);
            std::process::exit(1);
        }
    }
}
