use std::net::Ipv4Addr;

/// Checks whether an IPv4 address starts with the given leading octets
///
/// `prefix` holds one to three dot-separated octets, e.g. "58.192" matches
/// every address in 58.192.0.0/16. Malformed prefixes never match.
///
/// # Examples
///
/// ```
/// use std::net::Ipv4Addr;
/// use intrasearch::url::matches_ipv4_prefix;
///
/// assert!(matches_ipv4_prefix(&Ipv4Addr::new(58, 192, 1, 7), "58.192"));
/// assert!(!matches_ipv4_prefix(&Ipv4Addr::new(58, 193, 1, 7), "58.192"));
/// ```
pub fn matches_ipv4_prefix(addr: &Ipv4Addr, prefix: &str) -> bool {
    let octets = addr.octets();
    let mut matched = 0;

    for (i, part) in prefix.split('.').enumerate() {
        if i >= octets.len() {
            return false;
        }
        match part.parse::<u8>() {
            Ok(value) if value == octets[i] => matched += 1,
            _ => return false,
        }
    }

    matched > 0
}

/// Checks whether `host` is a subdomain of `domain`
///
/// The bare domain itself does not match: only hosts ending in
/// `.<domain>` do. Comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use intrasearch::url::is_subdomain_of;
///
/// assert!(is_subdomain_of("www.seu.edu.cn", "seu.edu.cn"));
/// assert!(!is_subdomain_of("seu.edu.cn", "seu.edu.cn"));
/// assert!(!is_subdomain_of("notseu.edu.cn", "seu.edu.cn"));
/// ```
pub fn is_subdomain_of(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    let domain = domain.to_ascii_lowercase();

    host.len() > domain.len() + 1
        && host.ends_with(&domain)
        && host.as_bytes()[host.len() - domain.len() - 1] == b'.'
}
