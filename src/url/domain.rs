use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use intrasearch::url::extract_host;
///
/// let url = Url::parse("http://WWW.SEU.EDU.CN/path").unwrap();
/// assert_eq!(extract_host(&url), Some("www.seu.edu.cn".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the last label of a domain name, if the host is a domain
///
/// IP literals have no top-level domain.
pub fn top_level_domain(url: &Url) -> Option<String> {
    match url.host()? {
        url::Host::Domain(domain) => domain
            .rsplit('.')
            .next()
            .filter(|label| !label.is_empty())
            .map(|label| label.to_ascii_lowercase()),
        _ => None,
    }
}
