use url::Url;

/// Resolves an anchor href to an absolute URL
///
/// Resolution rules:
/// - `/path` is joined to the site's declared origin, not the fetched page
/// - an href that already carries a scheme is parsed as-is
/// - anything else is resolved relative to the page that was fetched
///
/// Returns None for hrefs that never point at a document:
/// - empty or fragment-only hrefs
/// - `javascript:`, `mailto:`, `tel:` and `data:` schemes
/// - hrefs that fail to parse, or resolve to a non-HTTP(S) URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use normativa_scraper::url::resolve_href;
///
/// let origin = Url::parse("https://www.sii.cl").unwrap();
/// let page = Url::parse("https://www.sii.cl/normativa/2024/index.htm").unwrap();
///
/// let abs = resolve_href("/doc/a.pdf", &page, &origin).unwrap();
/// assert_eq!(abs.as_str(), "https://www.sii.cl/doc/a.pdf");
///
/// let rel = resolve_href("res1.pdf", &page, &origin).unwrap();
/// assert_eq!(rel.as_str(), "https://www.sii.cl/normativa/2024/res1.pdf");
/// ```
pub fn resolve_href(href: &str, page_url: &Url, site_origin: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let resolved = if href.starts_with('/') && !href.starts_with("//") {
        site_origin.join(href).ok()?
    } else if has_scheme(href) {
        Url::parse(href).ok()?
    } else {
        page_url.join(href).ok()?
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Returns true if the href starts with `scheme:` per RFC 3986
fn has_scheme(href: &str) -> bool {
    match href.split_once(':') {
        Some((scheme, _)) => {
            let mut chars = scheme.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Returns the last path segment of a URL, or None if the path ends in `/`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use normativa_scraper::url::path_basename;
///
/// let url = Url::parse("https://www.sii.cl/doc/res_45.pdf?v=2").unwrap();
/// assert_eq!(path_basename(&url), Some("res_45.pdf".to_string()));
///
/// let url = Url::parse("https://www.sii.cl/doc/").unwrap();
/// assert_eq!(path_basename(&url), None);
/// ```
pub fn path_basename(url: &Url) -> Option<String> {
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
