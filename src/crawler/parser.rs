//! Content extraction for fetched pages
//!
//! A tolerant single-pass scanner turns decoded HTML into plain text, the
//! first `<title>` and the `href` of every anchor. It never builds a tree
//! and never fails: malformed markup degrades into text.

/// Text and links extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Inner text of the first `<title>` element, empty if absent
    pub title: String,

    /// Visible text with tags replaced by spaces and whitespace collapsed
    pub body: String,

    /// Raw `href` values of `<a>` tags in document order
    pub links: Vec<String>,
}

/// Elements whose contents are dropped entirely
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Extracts title, body text and anchor links from an HTML document
///
/// # Rules
///
/// - `<!-- ... -->` comments and `<!...>` declarations are removed
/// - `script`, `style` and `template` elements are removed with their
///   contents
/// - every other tag becomes a single space
/// - `&nbsp;`, `&amp;`, `&lt;` and `&gt;` are unescaped
/// - whitespace runs collapse to one space and the result is trimmed
///
/// # Example
///
/// ```
/// use intrasearch::crawler::extract;
///
/// let page = extract("<html><title>Hi</title><p>a&amp;b</p><a href='/x'>x</a></html>");
/// assert_eq!(page.title, "Hi");
/// assert_eq!(page.body, "Hi a&b x");
/// assert_eq!(page.links, vec!["/x".to_string()]);
/// ```
pub fn extract(html: &str) -> ExtractedPage {
    let bytes = html.as_bytes();
    let mut text = String::with_capacity(html.len());
    let mut title: Option<String> = None;
    let mut links = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let lt = match find_byte(bytes, pos, b'<') {
            Some(lt) => lt,
            None => {
                text.push_str(&html[pos..]);
                break;
            }
        };
        text.push_str(&html[pos..lt]);

        if bytes[lt..].starts_with(b"<!--") {
            pos = find_subslice(bytes, lt + 4, b"-->").map_or(bytes.len(), |end| end + 3);
            continue;
        }

        let gt = match find_byte(bytes, lt + 1, b'>') {
            Some(gt) => gt,
            None => {
                // Unterminated tag: keep the rest as text
                text.push_str(&html[lt..]);
                break;
            }
        };

        if bytes.get(lt + 1) == Some(&b'!') {
            pos = gt + 1;
            continue;
        }

        let tag = parse_tag(&html[lt + 1..gt]);
        text.push(' ');
        pos = gt + 1;

        if tag.closing {
            continue;
        }

        if SKIPPED_ELEMENTS.contains(&tag.name.as_str()) {
            pos = find_closing_tag(bytes, pos, &tag.name).map_or(bytes.len(), |(_, end)| end);
            continue;
        }

        match tag.name.as_str() {
            "a" => {
                if let Some(href) = tag.href {
                    links.push(href);
                }
            }
            "title" if title.is_none() => {
                let inner_end =
                    find_closing_tag(bytes, pos, "title").map_or(bytes.len(), |(start, _)| start);
                title = Some(clean_text(&html[pos..inner_end]));
            }
            _ => {}
        }
    }

    ExtractedPage {
        title: title.unwrap_or_default(),
        body: clean_text(&text),
        links,
    }
}

/// Name and interesting attributes of one tag
struct Tag {
    name: String,
    closing: bool,
    href: Option<String>,
}

/// Parses the text between `<` and `>`
fn parse_tag(inner: &str) -> Tag {
    let rest = inner.trim_start();
    let (closing, rest) = match rest.strip_prefix('/') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, rest),
    };

    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == ':'))
        .unwrap_or(rest.len());
    let name = rest[..name_len].to_ascii_lowercase();

    let href = if !closing && name == "a" {
        find_attribute(&rest[name_len..], "href")
    } else {
        None
    };

    Tag {
        name,
        closing,
        href,
    }
}

/// Finds an attribute value, quoted with `"` or `'` or bare
fn find_attribute(attrs: &str, wanted: &str) -> Option<String> {
    let mut rest = attrs;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        rest = rest[name_len..].trim_start();

        let value = match rest.strip_prefix('=') {
            Some(after) => {
                let after = after.trim_start();
                let (value, remaining) = split_value(after);
                rest = remaining;
                Some(value)
            }
            None => None,
        };

        if name.eq_ignore_ascii_case(wanted) {
            if let Some(value) = value {
                return Some(value.to_string());
            }
        }
    }
}

/// Splits an attribute value off the front of `s`
fn split_value(s: &str) -> (&str, &str) {
    for quote in ['"', '\''] {
        if let Some(body) = s.strip_prefix(quote) {
            return match body.find(quote) {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            };
        }
    }

    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (&s[..end], &s[end..])
}

/// Locates `</name>` starting at `from`, tolerating whitespace and case
///
/// Returns the byte offset of the `<` and the offset just past the `>`.
fn find_closing_tag(bytes: &[u8], from: usize, name: &str) -> Option<(usize, usize)> {
    let name = name.as_bytes();
    let mut search = from;

    while let Some(lt) = find_byte(bytes, search, b'<') {
        search = lt + 1;

        let mut i = skip_whitespace(bytes, lt + 1);
        if bytes.get(i) != Some(&b'/') {
            continue;
        }
        i = skip_whitespace(bytes, i + 1);

        let end = i + name.len();
        if end > bytes.len() || !bytes[i..end].eq_ignore_ascii_case(name) {
            continue;
        }

        let i = skip_whitespace(bytes, end);
        if bytes.get(i) == Some(&b'>') {
            return Some((lt, i + 1));
        }
    }

    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

/// Unescapes the common entities, collapses whitespace and trims
fn clean_text(raw: &str) -> String {
    unescape_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn unescape_entities(raw: &str) -> String {
    const ENTITIES: &[(&str, char)] = &[
        ("&nbsp;", ' '),
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
    ];

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);

    out
}
