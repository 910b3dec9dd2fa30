pub mod html;

#[cfg(test)]
mod tests;

pub use html::{DocumentLinks, ParsedPage, extract_links};

/// Marker used when none is configured
pub const DEFAULT_MARKER: &str = ".pdf";

/// Errors raised while turning rendered markup into a document tree
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Nothing to parse; usually a failed render upstream
    #[error("markup is empty")]
    EmptyMarkup,
}
