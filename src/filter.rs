use regex::Regex;
use url::Url;

/// Configuration for filtering extracted document links
#[derive(Debug, Clone, Default)]
pub struct UrlFilterConfig {
    /// Regex patterns for URLs to include (if empty, all URLs are included unless excluded)
    pub include_patterns: Vec<String>,

    /// Regex patterns for URLs to exclude (these take precedence over include patterns)
    pub exclude_patterns: Vec<String>,
}

/// Decides which seeds are usable and which document links get fetched
#[derive(Debug, Default)]
pub struct UrlFilter {
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: &UrlFilterConfig) -> Result<Self, regex::Error> {
        let mut include_regexes = Vec::with_capacity(config.include_patterns.len());
        for pattern in &config.include_patterns {
            include_regexes.push(Regex::new(pattern)?);
        }

        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            include_regexes,
            exclude_regexes,
        })
    }

    /// Whether a seed is an absolute http(s) URL the browser can open
    pub fn is_valid_seed(url: &Url) -> bool {
        is_http(url) && url.has_host()
    }

    /// Resolve an extracted href against the page it was found on
    ///
    /// Returns `None` for hrefs that cannot become an http(s) URL, such as
    /// `mailto:` or `javascript:` targets.
    pub fn resolve(&self, page_url: &Url, href: &str) -> Option<Url> {
        let resolved = page_url.join(href).ok()?;
        if !is_http(&resolved) {
            return None;
        }
        Some(self.normalize_url(&resolved))
    }

    /// Determine if a document URL passes the include/exclude rules
    pub fn should_fetch(&self, url: &Url) -> bool {
        let url_str = url.as_str();

        // Exclusions take precedence
        if self.exclude_regexes.iter().any(|re| re.is_match(url_str)) {
            return false;
        }

        self.include_regexes.is_empty() || self.include_regexes.iter().any(|re| re.is_match(url_str))
    }

    /// Create a normalized version of the URL (e.g., removing fragments)
    pub fn normalize_url(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }
}

fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
