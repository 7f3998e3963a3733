//! Per-project origin allowlist for widget submissions.
//!
//! A project may restrict which sites can embed its widget through a
//! comma-separated list of patterns. Supported forms:
//! - Plain hosts: `example.com`, `localhost`, `myapp.netlify.app`
//! - Full URLs pasted from the address bar: `https://example.com`
//! - Wildcards: `*.example.com` (also matches `example.com` itself)
//!
//! Matching compares hostnames only; ports and paths are ignored.

use axum::http::{header, HeaderMap};
use tracing::debug;
use url::Url;

/// Decide whether a request from `origin` may use a project's widget.
///
/// An empty or missing allowlist means the project is unrestricted and
/// every request passes, including ones without an origin. Once a list is
/// configured, requests that do not declare an origin are rejected.
pub fn is_origin_allowed(origin: Option<&str>, allowed_domains: Option<&str>) -> bool {
    let allowed_domains = match allowed_domains {
        Some(domains) if !domains.trim().is_empty() => domains,
        _ => return true,
    };

    let origin = match origin {
        Some(o) => o,
        None => {
            debug!("origin_missing_for_restricted_project");
            return false;
        }
    };

    let hostname = extract_hostname(origin).to_lowercase();

    let allowed = parse_allowed_domains(allowed_domains)
        .iter()
        .any(|pattern| pattern_matches(pattern, &hostname));

    if !allowed {
        debug!(origin = %origin, hostname = %hostname, "origin_not_in_allowlist");
    }

    allowed
}

/// Pull the bare hostname out of an `Origin`/`Referer` value.
///
/// Never fails: input that cannot be parsed is used verbatim.
pub fn extract_hostname(origin: &str) -> String {
    if origin.contains("://") {
        return match Url::parse(origin) {
            Ok(url) => url
                .host_str()
                .map(str::to_string)
                .unwrap_or_else(|| origin.to_string()),
            Err(_) => origin.to_string(),
        };
    }

    // `localhost:3000` and friends
    origin.split(':').next().unwrap_or(origin).to_string()
}

/// Split a stored allowlist into trimmed, lowercased, non-empty patterns.
pub fn parse_allowed_domains(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

/// Test one lowercased pattern against a lowercased hostname.
fn pattern_matches(pattern: &str, hostname: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        return hostname == base || hostname.ends_with(&format!(".{}", base));
    }

    if pattern.starts_with("http://") || pattern.starts_with("https://") {
        return match Url::parse(pattern).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
            Some(host) => host == hostname,
            None => hostname == pattern,
        };
    }

    hostname == pattern
}

/// The origin a browser declared for this request: `Origin`, else `Referer`.
pub fn request_origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::ORIGIN)
        .or_else(|| headers.get(header::REFERER))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
