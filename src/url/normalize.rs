/// Computes the standardized key of a URL
///
/// The key is the sole identity used to deduplicate URLs across the frontier
/// and the page store.
///
/// # Standardization Steps
///
/// 1. Drop the scheme prefix: everything up to the first `:` that is
///    followed by `/`, together with the run of slashes after it
/// 2. Drop any `/` that sits directly before `?` or at the end of the string
/// 3. Lowercase the result
///
/// Standardization never fails; input without a scheme prefix is only
/// subjected to steps 2 and 3.
///
/// # Examples
///
/// ```
/// use intrasearch::url::standardize;
///
/// assert_eq!(standardize("HTTP://Example.com/a/"), "example.com/a");
/// assert_eq!(standardize("http://example.com/a/?x=1"), "example.com/a?x=1");
/// assert_eq!(standardize("http://example.com/a/b"), "example.com/a/b");
/// ```
pub fn standardize(url: &str) -> String {
    let rest = strip_scheme(url);

    let mut key = String::with_capacity(rest.len());
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && matches!(chars.peek(), None | Some('?')) {
            continue;
        }
        key.push(c);
    }

    key.to_lowercase()
}

/// Returns the part of `url` after its `scheme:` and following slashes
fn strip_scheme(url: &str) -> &str {
    match url.find(":/") {
        Some(idx) => url[idx + 1..].trim_start_matches('/'),
        None => url,
    }
}
