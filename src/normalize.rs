//! URL canonicalization and parameter detection.
//!
//! Normalization lower-cases the scheme and authority and collapses runs of
//! `/` in the path. Query and fragment are carried through byte for byte.
//! Anything that cannot be split into components is returned untouched.

use std::net::Ipv6Addr;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

/// How a normalized URL is tested for parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    /// A `?` followed anywhere later by `=`.
    #[default]
    Loose,
    /// A parsed query component holding at least one `key=value` pair.
    Strict,
}

struct Parts<'a> {
    scheme: Option<&'a str>,
    authority: Option<&'a str>,
    path: &'a str,
    query: Option<&'a str>,
    fragment: Option<&'a str>,
}

fn slash_runs() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new("/+").ok()).as_ref()
}

fn loose_assignment() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\?.*=").ok()).as_ref()
}

fn is_scheme(candidate: &str) -> bool {
    candidate.starts_with(|c: char| c.is_ascii_alphabetic())
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn brackets_are_valid(authority: &str) -> bool {
    let open = authority.contains('[');
    let close = authority.contains(']');
    if open != close {
        return false;
    }
    if !open {
        return true;
    }

    let host = authority.rsplit_once('@').map_or(authority, |(_, host)| host);
    let (Some(start), Some(end)) = (host.find('['), host.find(']')) else {
        // Brackets only in userinfo.
        return true;
    };
    if end < start {
        return false;
    }

    let inner = &host[start + 1..end];
    if inner.starts_with(['v', 'V']) {
        return true;
    }
    let address = inner.split_once('%').map_or(inner, |(address, _)| address);
    address.parse::<Ipv6Addr>().is_ok()
}

fn split(raw: &str) -> Option<Parts<'_>> {
    let mut rest = raw;

    let mut scheme = None;
    if let Some(colon) = rest.find(':') {
        let candidate = &rest[..colon];
        if is_scheme(candidate) {
            scheme = Some(candidate);
            rest = &rest[colon + 1..];
        }
    }

    let mut authority = None;
    if let Some(after) = rest.strip_prefix("//") {
        let end = after.find(['/', '?', '#']).unwrap_or(after.len());
        let netloc = &after[..end];
        if !brackets_are_valid(netloc) {
            return None;
        }
        authority = Some(netloc);
        rest = &after[end..];
    }

    let (rest, fragment) = match rest.split_once('#') {
        Some((before, fragment)) => (before, Some(fragment)),
        None => (rest, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    Some(Parts {
        scheme,
        authority,
        path,
        query,
        fragment,
    })
}

/// Canonicalize `raw`, or return it unchanged when it cannot be split.
///
/// Empty `?` and `#` markers are kept, so `http://a.com/?#=` stays as it is
/// and classifies as parameterized. `;params` stay part of the path.
pub fn normalize_url(raw: &str) -> String {
    let (Some(parts), Some(slashes)) = (split(raw), slash_runs()) else {
        return raw.to_string();
    };

    let mut normalized = String::with_capacity(raw.len());
    if let Some(scheme) = parts.scheme {
        normalized.push_str(&scheme.to_ascii_lowercase());
        normalized.push(':');
    }
    if let Some(authority) = parts.authority {
        normalized.push_str("//");
        normalized.push_str(&authority.to_lowercase());
    }
    normalized.push_str(&slashes.replace_all(parts.path, "/"));
    if let Some(query) = parts.query {
        normalized.push('?');
        normalized.push_str(query);
    }
    if let Some(fragment) = parts.fragment {
        normalized.push('#');
        normalized.push_str(fragment);
    }
    normalized
}

fn has_query_assignment(normalized: &str) -> bool {
    Url::parse(normalized)
        .ok()
        .and_then(|url| {
            url.query().map(|query| {
                query
                    .split('&')
                    .any(|pair| matches!(pair.split_once('='), Some((key, _)) if !key.is_empty()))
            })
        })
        .unwrap_or(false)
}

/// Test an already-normalized URL.
pub fn matches_normalized(normalized: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Loose => loose_assignment().is_some_and(|re| re.is_match(normalized)),
        MatchMode::Strict => has_query_assignment(normalized),
    }
}

/// Normalize `raw` and return the normalized form if it carries parameters.
pub fn param_url(raw: &str, mode: MatchMode) -> Option<String> {
    let normalized = normalize_url(raw);
    matches_normalized(&normalized, mode).then_some(normalized)
}

pub fn is_parameterized(raw: &str) -> bool {
    param_url(raw, MatchMode::Loose).is_some()
}
