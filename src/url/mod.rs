//! URL handling module for Intrasearch
//!
//! This module provides URL standardization, relative link resolution and
//! the admission rules that keep the crawl inside the intranet.

mod domain;
mod matcher;
mod normalize;

use crate::config::FilterConfig;
use crate::{UrlError, UrlResult};
use url::{Host, Url};

// Re-export main functions
pub use domain::{extract_host, top_level_domain};
pub use matcher::{is_subdomain_of, matches_ipv4_prefix};
pub use normalize::standardize;

/// Schemes a discovered link may use
const ALLOWED_SCHEMES: &[&str] = &["http", "https", "ftp"];

/// Resolves a raw `href` value against the page it was found on
///
/// One pair of surrounding quotes is removed, the value is joined onto
/// `base`, and the fragment is dropped. Links that do not resolve to a URL
/// with a host are rejected.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use intrasearch::url::resolve_link;
///
/// let base = Url::parse("http://www.seu.edu.cn/news/index.htm").unwrap();
/// let link = resolve_link("\"2024/a.htm#top\"", &base).unwrap();
/// assert_eq!(link.as_str(), "http://www.seu.edu.cn/news/2024/a.htm");
/// ```
pub fn resolve_link(raw: &str, base: &Url) -> UrlResult<Url> {
    let href = strip_quotes(raw.trim());

    let mut url = base
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;
    url.set_fragment(None);

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}

fn strip_quotes(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Decides which discovered links belong to the crawl
///
/// A link is admitted when its scheme is http, https or ftp and its host is
/// either an IPv4 address inside one of the configured ranges or a subdomain
/// of the institution domain that is not explicitly excluded. Whether the
/// link is already known is the frontier's concern, not the filter's.
#[derive(Debug, Clone)]
pub struct LinkFilter {
    institution_domain: String,
    excluded_hosts: Vec<String>,
    private_prefixes: Vec<String>,
}

impl LinkFilter {
    /// Builds a filter from the `[filter]` configuration section
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            institution_domain: config.institution_domain.to_ascii_lowercase(),
            excluded_hosts: config
                .excluded_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            private_prefixes: config.private_prefixes.clone(),
        }
    }

    /// Returns true if the URL's scheme and host are inside the crawl
    pub fn admits(&self, url: &Url) -> bool {
        if !ALLOWED_SCHEMES.contains(&url.scheme()) {
            return false;
        }

        match url.host() {
            Some(Host::Ipv4(addr)) => self
                .private_prefixes
                .iter()
                .any(|prefix| matches_ipv4_prefix(&addr, prefix)),
            Some(Host::Domain(domain)) => {
                let domain = domain.to_ascii_lowercase();
                is_subdomain_of(&domain, &self.institution_domain)
                    && !self.excluded_hosts.iter().any(|h| *h == domain)
            }
            _ => false,
        }
    }

    /// Resolves a raw link found on `base` and returns it if admitted
    ///
    /// Malformed links and links pointing back at `base` yield `None`; the
    /// rejection is logged at debug level only.
    pub fn admit_link(&self, raw: &str, base: &Url) -> Option<Url> {
        let url = match resolve_link(raw, base) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Dropping malformed link {:?}: {}", raw, e);
                return None;
            }
        };

        if url.as_str() == base.as_str() || !self.admits(&url) {
            return None;
        }

        Some(url)
    }
}
