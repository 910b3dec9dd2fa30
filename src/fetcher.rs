use crate::results::{DownloadOutcome, DownloadRecord};
use crate::utils::sanitize_filename;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Content types accepted as a real document rather than an error page
const ACCEPTED_CONTENT_TYPES: [&str; 3] = [
    "application/pdf",
    "binary/octet-stream",
    "application/octet-stream",
];

/// Maps a document URL to the file name it is stored under
pub type FileNamer = fn(&str) -> String;

/// Reasons a single document download can fail
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("no usable file name could be derived (got {0:?})")]
    InvalidName(String),

    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("invalid content type {0:?} (expected application/pdf or an octet-stream)")]
    ContentType(String),

    #[error("failed to read response body: {0}")]
    Read(#[source] reqwest::Error),

    #[error("downloaded 0 bytes")]
    EmptyBody,

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Downloads document URLs into a flat output directory
///
/// Each URL is attempted once. A file that already exists under the derived
/// name is never requested again or overwritten.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    output_dir: PathBuf,
    namer: FileNamer,
}

impl Fetcher {
    /// Create a fetcher writing into `output_dir` with a per-request timeout
    pub fn new(
        output_dir: impl Into<PathBuf>,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            output_dir: output_dir.into(),
            namer: sanitize_filename,
        })
    }

    /// Replace the function used to name downloaded files
    pub fn with_namer(mut self, namer: FileNamer) -> Self {
        self.namer = namer;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Local file name for a link as it appeared on the page
    pub fn file_name(&self, link: &str) -> String {
        (self.namer)(link).to_lowercase()
    }

    /// Download one document, reporting the outcome through the log
    ///
    /// `url` is what gets requested; the file is named from `link`, the href
    /// as written in the page, so names do not pick up percent-encoding added
    /// when the link was resolved.
    pub async fn fetch(&self, url: &str, link: &str) -> DownloadRecord {
        let name = self.file_name(link);
        let path = self.output_dir.join(&name);

        let outcome = if !is_plain_file_name(&name) {
            DownloadOutcome::Failed(FetchError::InvalidName(name))
        } else if is_existing_file(&path).await {
            DownloadOutcome::Skipped
        } else {
            match self.download(url, &path).await {
                Ok(bytes) => DownloadOutcome::Written { bytes },
                Err(e) => DownloadOutcome::Failed(e),
            }
        };

        match &outcome {
            DownloadOutcome::Written { bytes } => {
                ::log::info!("Downloaded {} bytes: {} -> {}", bytes, url, path.display());
            }
            DownloadOutcome::Skipped => {
                ::log::info!("File already exists, skipping: {}", path.display());
            }
            DownloadOutcome::Failed(e) => {
                ::log::error!("Failed to download {}: {}", url, e);
            }
        }

        DownloadRecord::new(url.to_string(), path, outcome)
    }

    /// Request, validate and store a document, returning the bytes written
    async fn download(&self, url: &str, path: &Path) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !ACCEPTED_CONTENT_TYPES
            .iter()
            .any(|accepted| content_type.contains(accepted))
        {
            return Err(FetchError::ContentType(content_type));
        }

        // Buffer the whole body so nothing touches disk until it is complete
        let body = response.bytes().await.map_err(FetchError::Read)?;
        if body.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        commit(path, &body).await?;
        Ok(body.len() as u64)
    }
}

/// Write `bytes` beside `path` and rename into place
///
/// A failed write never leaves a truncated file under the final name.
async fn commit(path: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let part = part_path(path);

    let written: std::io::Result<()> = async {
        let mut file = tokio::fs::File::create(&part).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&part, path).await
    }
    .await;

    if let Err(source) = written {
        if let Err(e) = tokio::fs::remove_file(&part).await {
            ::log::debug!("Could not remove {}: {}", part.display(), e);
        }
        return Err(FetchError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    Ok(())
}

/// Hidden sibling used while a download is being written
fn part_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.part", name))
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

async fn is_existing_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
