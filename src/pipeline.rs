use crate::fetcher::Fetcher;
use crate::filter::UrlFilter;
use crate::parsers::{self, extract_links};
use crate::renderer::PageRenderer;
use crate::results::RunSummary;
use crate::utils::remove_duplicates;
use url::Url;

/// A document link found on a page, with the URL it resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    /// Trimmed href as written in the page
    pub href: String,

    /// Absolute URL to request
    pub url: Url,
}

/// Drives render -> extract -> fetch over a list of seed pages
///
/// Everything runs sequentially: one page is rendered and all of its
/// documents fetched, in document order, before the next page starts.
/// Failures are logged and never abort the run.
pub struct Harvester<R> {
    renderer: R,
    fetcher: Fetcher,
    filter: UrlFilter,
    marker: String,
}

impl<R: PageRenderer> Harvester<R> {
    pub fn new(renderer: R, fetcher: Fetcher, filter: UrlFilter) -> Self {
        Self {
            renderer,
            fetcher,
            filter,
            marker: parsers::DEFAULT_MARKER.to_string(),
        }
    }

    /// Set the substring that identifies document links
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Process every seed and return what happened
    pub async fn run(&self, seeds: Vec<String>) -> RunSummary {
        let start_time = std::time::Instant::now();
        let mut summary = RunSummary::default();

        let output_dir = self.fetcher.output_dir();
        if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
            ::log::error!(
                "Failed to create output directory {}: {}",
                output_dir.display(),
                e
            );
        }

        for seed in remove_duplicates(seeds) {
            self.harvest_page(&seed, &mut summary).await;
        }

        ::log::info!(
            "Harvest complete - {} pages rendered ({} failed), {} links found, {} downloaded, {} skipped, {} failed in {:.2} seconds",
            summary.pages_rendered,
            summary.pages_failed,
            summary.links_found,
            summary.downloaded,
            summary.skipped,
            summary.failed,
            start_time.elapsed().as_secs_f64()
        );

        summary
    }

    async fn harvest_page(&self, seed: &str, summary: &mut RunSummary) {
        let page_url = match Url::parse(seed) {
            Ok(url) if UrlFilter::is_valid_seed(&url) => url,
            _ => {
                ::log::error!("Skipping invalid seed URL: {}", seed);
                summary.pages_failed += 1;
                return;
            }
        };

        let rendered = match self.renderer.render(seed).await {
            Ok(doc) => doc,
            Err(e) => {
                ::log::error!("No links collected from {}: {}", seed, e);
                summary.pages_failed += 1;
                return;
            }
        };
        summary.pages_rendered += 1;

        let links = self.document_links(&page_url, rendered.html());
        ::log::info!("Found {} document links in {}", links.len(), seed);
        summary.links_found += links.len();

        for link in links {
            let record = self.fetcher.fetch(link.url.as_str(), &link.href).await;
            summary.record(&record);
        }
    }

    /// Extract, resolve and filter the document links of a rendered page
    fn document_links(&self, page_url: &Url, html: &str) -> Vec<DocumentLink> {
        extract_links(html, &self.marker)
            .into_iter()
            .filter_map(|href| match self.filter.resolve(page_url, &href) {
                Some(url) => Some(DocumentLink { href, url }),
                None => {
                    ::log::debug!("Ignoring unusable link {:?} on {}", href, page_url);
                    None
                }
            })
            .filter(|link| {
                let keep = self.filter.should_fetch(&link.url);
                if !keep {
                    ::log::debug!("URL filter rejected: {}", link.url);
                }
                keep
            })
            .collect()
    }
}
