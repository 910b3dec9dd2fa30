use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex is valid"));
static UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("static regex is valid"));

/// Extension echoes left behind once the dot of a real extension becomes `_`
const EXTENSION_ECHOES: [&str; 3] = ["_pdf", "_zip", "_txt"];

/// Convert a document URL to a sanitized filename
///
/// The result is lower-case, built from `[a-z0-9_]`, and keeps the extension
/// of the last path segment. Query strings are ignored, so
/// `https://example.com/manuals/Radio-Guide.PDF?v=2` becomes `radio_guide.pdf`.
/// Distinct URLs may map to the same name.
pub fn sanitize_filename(url: &str) -> String {
    let lower = url.to_lowercase();
    let without_query = lower.split('?').next().unwrap_or_default();

    let name = base_name(without_query);
    let ext = extension(name);

    let safe = NON_ALNUM.replace_all(name, "_");
    let safe = UNDERSCORES.replace_all(&safe, "_");
    let mut safe = safe.trim_matches('_').to_string();

    for echo in EXTENSION_ECHOES {
        safe = safe.replace(echo, "");
    }

    if extension(&safe).is_empty() {
        safe.push_str(ext);
    }

    safe
}

/// Last element of a slash-separated path, ignoring trailing slashes
fn base_name(path: &str) -> &str {
    if path.is_empty() {
        return ".";
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/";
    }
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Suffix starting at the final dot of the last path element, or ""
fn extension(name: &str) -> &str {
    let last = name.rsplit('/').next().unwrap_or(name);
    match last.rfind('.') {
        Some(idx) => &last[idx..],
        None => "",
    }
}

/// Remove duplicate URLs, keeping the first occurrence of each
pub fn remove_duplicates(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(urls.len());
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
