use crate::fetcher::FetchError;
use serde::Serialize;
use std::path::PathBuf;

/// Fully rendered markup captured from the browser
///
/// Only non-empty markup can be wrapped, so an empty capture is always
/// reported as a failure rather than as a page without links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    html: String,
}

impl RenderedDocument {
    /// Wrap captured markup, returning `None` when it is blank
    pub fn new(html: String) -> Option<Self> {
        if html.trim().is_empty() {
            None
        } else {
            Some(Self { html })
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

/// How a single download attempt ended
#[derive(Debug)]
pub enum DownloadOutcome {
    /// A new file was written with this many bytes
    Written { bytes: u64 },
    /// A file with the same sanitized name already exists
    Skipped,
    Failed(FetchError),
}

/// Outcome of one retrieval attempt for a document URL
#[derive(Debug)]
pub struct DownloadRecord {
    /// URL that was requested
    pub url: String,

    /// Destination path derived from the URL
    pub path: PathBuf,

    pub outcome: DownloadOutcome,
}

impl DownloadRecord {
    /// Create a new download record
    pub fn new(url: String, path: PathBuf, outcome: DownloadOutcome) -> Self {
        Self { url, path, outcome }
    }

    /// Whether this attempt created a new file
    pub fn wrote_file(&self) -> bool {
        matches!(self.outcome, DownloadOutcome::Written { .. })
    }
}

/// Counters collected over one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Seeds rendered successfully
    pub pages_rendered: usize,

    /// Seeds that were invalid or failed to render
    pub pages_failed: usize,

    /// Document links extracted across all pages
    pub links_found: usize,

    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    /// Fold a download record into the counters
    pub fn record(&mut self, record: &DownloadRecord) {
        match record.outcome {
            DownloadOutcome::Written { .. } => self.downloaded += 1,
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_markup_is_not_a_document() {
        assert!(RenderedDocument::new(String::new()).is_none());
        assert!(RenderedDocument::new("  \n\t ".to_string()).is_none());

        let doc = RenderedDocument::new("<html></html>".to_string()).unwrap();
        assert_eq!(doc.html(), "<html></html>");
    }

    #[test]
    fn test_summary_counts_outcomes() {
        let mut summary = RunSummary::default();
        let path = PathBuf::from("PDFs/a.pdf");

        summary.record(&DownloadRecord::new(
            "https://example.com/a.pdf".to_string(),
            path.clone(),
            DownloadOutcome::Written { bytes: 12 },
        ));
        summary.record(&DownloadRecord::new(
            "https://example.com/a.pdf".to_string(),
            path.clone(),
            DownloadOutcome::Skipped,
        ));
        summary.record(&DownloadRecord::new(
            "https://example.com/a.pdf".to_string(),
            path,
            DownloadOutcome::Failed(FetchError::EmptyBody),
        ));

        assert_eq!(summary.downloaded, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
    }
}
