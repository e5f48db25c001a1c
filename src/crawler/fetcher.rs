//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - HEAD probes that classify a URL before downloading it
//! - GET requests returning the raw body
//! - Charset detection and decoding of the body

use crate::config::CrawlerConfig;
use crate::crawler::FetchError;
use crate::url::resolve_link;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use url::Url;

/// What a HEAD probe says about a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The server redirected; the resolved target should be crawled instead
    Redirect(Url),

    /// The resource is not HTML
    NotHtml {
        /// The Content-Type header value received
        content_type: String,
    },

    /// Go ahead and download the body
    Proceed,
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed automatically; the crawl loop treats a
/// redirect as a newly discovered URL. Every request carries the configured
/// per-call timeout.
///
/// # Example
///
/// ```no_run
/// use intrasearch::config::CrawlerConfig;
/// use intrasearch::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends a HEAD request and classifies the response
///
/// | Response | Outcome |
/// |----------|---------|
/// | 3xx with `Location` | `Redirect` to the resolved target |
/// | 3xx without `Location` | error |
/// | 405 Method Not Allowed | `Proceed` (inconclusive) |
/// | other non-success | error |
/// | success, not `text/html` | `NotHtml` |
/// | success, `text/html` | `Proceed` |
///
/// A `Redirect` target is only followed when it passes the same
/// `LinkFilter` as an extracted link, so a redirect never leaves the
/// intranet. See `Frontier::enqueue_redirect` for targets that share the
/// redirecting URL's key.
pub async fn probe(client: &Client, url: &Url) -> Result<Probe, FetchError> {
    let response = client.head(url.clone()).send().await?;
    let status = response.status();

    if status.is_redirection() {
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(FetchError::MissingLocation(status.as_u16()))?;

        let target = resolve_link(location, url)
            .map_err(|e| FetchError::InvalidRedirect(format!("{}: {}", location, e)))?;
        return Ok(Probe::Redirect(target));
    }

    if status == StatusCode::METHOD_NOT_ALLOWED {
        return Ok(Probe::Proceed);
    }

    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.to_ascii_lowercase().contains("text/html") {
        return Ok(Probe::NotHtml { content_type });
    }

    Ok(Probe::Proceed)
}

/// Downloads the body of a URL as raw bytes
pub async fn fetch_body(client: &Client, url: &Url) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url.clone()).send().await?;
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    Ok(response.bytes().await?.to_vec())
}

/// Decodes a page body to UTF-8
///
/// A byte order mark wins; otherwise the encoding is guessed from the bytes,
/// using the host's top-level domain as a hint. Malformed sequences become
/// U+FFFD, so decoding never fails.
pub fn decode_body(bytes: &[u8], tld: Option<&str>) -> String {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(tld.map(str::as_bytes), true)
        }
    };

    let (text, actual, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!("Lossy decode as {}", actual.name());
    }

    text.into_owned()
}
