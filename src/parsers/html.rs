use crate::parsers::ParseError;
use scraper::{ElementRef, Html};

/// Rendered markup parsed into a DOM tree
pub struct ParsedPage {
    doc: Html,
}

impl ParsedPage {
    /// Parses rendered markup
    ///
    /// The HTML parser recovers from malformed input, so the only hard
    /// failure is markup with nothing in it.
    pub fn parse(markup: &str) -> Result<Self, ParseError> {
        if markup.trim().is_empty() {
            return Err(ParseError::EmptyMarkup);
        }

        let doc = Html::parse_document(markup);
        if !doc.errors.is_empty() {
            ::log::debug!("HTML parser recovered from {} errors", doc.errors.len());
        }

        Ok(Self { doc })
    }

    /// Iterates over every `<a href>` whose target contains `marker`,
    /// ignoring case, in document order
    ///
    /// Each call starts a fresh walk of the tree.
    pub fn links<'a>(&'a self, marker: &str) -> DocumentLinks<'a> {
        DocumentLinks {
            stack: vec![self.doc.root_element()],
            marker: marker.to_lowercase(),
        }
    }
}

/// Depth-first walk over the element tree yielding matching hrefs
pub struct DocumentLinks<'a> {
    stack: Vec<ElementRef<'a>>,
    marker: String,
}

impl<'a> Iterator for DocumentLinks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(element) = self.stack.pop() {
            // Push in reverse so the first child is visited next
            let children: Vec<ElementRef<'a>> =
                element.children().filter_map(ElementRef::wrap).collect();
            self.stack.extend(children.into_iter().rev());

            if element.value().name() != "a" {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                let href = href.trim();
                if href.to_lowercase().contains(&self.marker) {
                    return Some(href);
                }
            }
        }
        None
    }
}

/// Parses markup and collects every matching document link
///
/// Parse failures are logged and produce an empty list.
pub fn extract_links(markup: &str, marker: &str) -> Vec<String> {
    let page = match ParsedPage::parse(markup) {
        Ok(page) => page,
        Err(e) => {
            ::log::error!("Failed to parse rendered markup: {}", e);
            return Vec::new();
        }
    };

    let links = page
        .links(marker)
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

    ::log::debug!("HTML parser found {} document links", links.len());
    if !links.is_empty() {
        ::log::debug!(
            "First few links: {:?}",
            links.iter().take(5).collect::<Vec<_>>()
        );
    }

    links
}
