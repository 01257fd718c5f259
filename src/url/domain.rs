use url::Url;

/// Returns the key used to pace requests to the same host
///
/// The key is the lowercase host plus the port when one is explicit, so two
/// servers on the same machine are paced independently. URLs without a host
/// share the empty key.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use normativa_scraper::url::host_key;
///
/// let url = Url::parse("https://WWW.SII.CL/path").unwrap();
/// assert_eq!(host_key(&url), "www.sii.cl");
///
/// let url = Url::parse("http://127.0.0.1:8080/index.htm").unwrap();
/// assert_eq!(host_key(&url), "127.0.0.1:8080");
/// ```
pub fn host_key(url: &Url) -> String {
    let host = url.host_str().map(str::to_lowercase).unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    }
}
