//! Shared encoding and matching utilities.

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Strip leading zero bytes of a DER integer, keeping at least one byte.
pub fn strip_leading_zeros(raw: &[u8]) -> &[u8] {
    match raw.iter().position(|&b| b != 0) {
        Some(pos) => raw.get(pos..).unwrap_or(raw),
        None => raw.get(raw.len().saturating_sub(1)..).unwrap_or(raw),
    }
}

/// Whether the input looks like PEM (starts with `-----BEGIN` after
/// leading whitespace).
pub fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Match a hostname against certificate DNS names, falling back to the CN
/// only when there are no DNS names.
///
/// Comparison is ASCII case-insensitive and ignores a trailing dot. A
/// pattern `*.example.com` matches exactly one extra left-most label.
pub fn verify_hostname_match(dns_names: &[String], cn: Option<&str>, hostname: &str) -> bool {
    let host = normalize(hostname);
    if host.is_empty() {
        return false;
    }
    if !dns_names.is_empty() {
        return dns_names
            .iter()
            .any(|pattern| hostname_matches(&normalize(pattern), &host));
    }
    cn.is_some_and(|cn| hostname_matches(&normalize(cn), &host))
}

fn normalize(name: &str) -> String {
    name.trim_end_matches('.').to_ascii_lowercase()
}

fn hostname_matches(pattern: &str, host: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("*.") {
        // The wildcard covers exactly one non-empty label.
        match host.split_once('.') {
            Some((label, rest)) => !label.is_empty() && !suffix.is_empty() && rest == suffix,
            None => false,
        }
    } else {
        pattern == host
    }
}
