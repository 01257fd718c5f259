//! HTML link extraction
//!
//! This module turns an index page into the list of document links worth
//! downloading. It never touches the network or the filesystem: bytes in,
//! links out.

use crate::config::FilterConfig;
use crate::url::{path_basename, resolve_href};
use scraper::{ElementRef, Html, Selector};
use std::borrow::Cow;
use std::collections::HashSet;
use url::Url;

/// Element id LeyChile pages use for their PDF download anchor
const PDF_LINK_ID: &str = "linkPdf";

/// A document link discovered on an index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    /// Absolute document URL
    pub url: Url,

    /// Anchor text, whitespace collapsed
    pub anchor_text: String,

    /// Page the link was found on
    pub source_page: Url,
}

/// Tokens deciding which anchors are document links
///
/// All tokens are stored lowercase; matching is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFilters {
    /// Matched against the href (e.g. ".pdf", ".docx")
    pub extensions: Vec<String>,

    /// Matched against the href and, if `match_text`, the anchor text
    pub keywords: Vec<String>,

    pub match_text: bool,
}

impl LinkFilters {
    pub fn new<E, K>(extensions: E, keywords: K, match_text: bool) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        K: IntoIterator,
        K::Item: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
            keywords: keywords
                .into_iter()
                .map(|t| t.as_ref().to_lowercase())
                .collect(),
            match_text,
        }
    }

    /// Returns true if an anchor passes the filters
    pub fn matches(&self, href: &str, anchor_text: &str) -> bool {
        let href = href.to_lowercase();

        if self.extensions.iter().any(|ext| href.contains(ext.as_str())) {
            return true;
        }

        if self.keywords.iter().any(|kw| href.contains(kw.as_str())) {
            return true;
        }

        if self.match_text {
            let text = anchor_text.to_lowercase();
            return self.keywords.iter().any(|kw| text.contains(kw.as_str()));
        }

        false
    }
}

impl From<&FilterConfig> for LinkFilters {
    fn from(config: &FilterConfig) -> Self {
        Self::new(&config.extensions, &config.keywords, config.match_text)
    }
}

/// Decodes an HTML body
///
/// SII pages are still partly served as ISO-8859-1; bytes that are not valid
/// UTF-8 are read as Latin-1 so accented anchor text survives.
pub fn decode_html(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
    }
}

/// Extracts every document link on an index page
///
/// # Rules
///
/// - every `<a href>` is a candidate; unresolvable hrefs are skipped
/// - a candidate must pass `filters`
/// - duplicates (same resolved URL) are dropped, first occurrence wins
/// - an anchor with no text is dropped unless its URL ends in a filename
///
/// Output order is document order.
///
/// # Example
///
/// ```
/// use normativa_scraper::crawler::{extract_links, LinkFilters};
/// use url::Url;
///
/// let html = br#"<a href="/doc/a.pdf">A</a><a href="/doc/a.pdf">A again</a>"#;
/// let origin = Url::parse("https://www.sii.cl").unwrap();
/// let filters = LinkFilters::new([".pdf"], ["resolucion"], true);
///
/// let links = extract_links(html, &origin, &origin, &filters);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].url.as_str(), "https://www.sii.cl/doc/a.pdf");
/// ```
pub fn extract_links(
    html: &[u8],
    page_url: &Url,
    site_origin: &Url,
    filters: &LinkFilters,
) -> Vec<DocumentLink> {
    let document = Html::parse_document(&decode_html(html));
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let text = anchor_text(&element);
        if !filters.matches(href, &text) {
            continue;
        }

        let Some(url) = resolve_href(href, page_url, site_origin) else {
            continue;
        };

        if text.is_empty() && !has_filename(&url) {
            continue;
        }

        if !seen.insert(url.as_str().to_string()) {
            continue;
        }

        links.push(DocumentLink {
            url,
            anchor_text: text,
            source_page: page_url.clone(),
        });
    }

    links
}

/// Finds the canonical PDF link on a law page
///
/// Returns the first anchor with text whose href mentions "pdf" or whose text
/// mentions "descargar". Falls back to the `#linkPdf` anchor, which not every
/// page carries; `None` means no link was found.
pub fn find_primary_pdf_link(
    html: &[u8],
    page_url: &Url,
    site_origin: &Url,
) -> Option<DocumentLink> {
    let document = Html::parse_document(&decode_html(html));
    let selector = Selector::parse("a[href]").ok()?;

    for element in document.select(&selector) {
        let text = anchor_text(&element);
        if text.is_empty() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let looks_like_pdf = href.to_lowercase().contains("pdf")
            || text.to_lowercase().contains("descargar");
        if !looks_like_pdf {
            continue;
        }

        if let Some(url) = resolve_href(href, page_url, site_origin) {
            return Some(DocumentLink {
                url,
                anchor_text: text,
                source_page: page_url.clone(),
            });
        }
    }

    let fallback = Selector::parse(&format!("a#{}[href]", PDF_LINK_ID)).ok()?;
    let element = document.select(&fallback).next()?;
    let url = resolve_href(element.value().attr("href")?, page_url, site_origin)?;

    Some(DocumentLink {
        url,
        anchor_text: anchor_text(&element),
        source_page: page_url.clone(),
    })
}

/// Anchor text with whitespace runs collapsed to single spaces
fn anchor_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// True if the last path segment looks like a filename (`name.ext`)
fn has_filename(url: &Url) -> bool {
    path_basename(url)
        .map(|name| {
            name.rfind('.')
                .map(|dot| dot > 0 && dot + 1 < name.len())
                .unwrap_or(false)
        })
        .unwrap_or(false)
}
