//! Cookie store kept by a client across requests
//!
//! Cookies are scoped the RFC 6265 way: a host-only cookie is sent back to
//! exactly the host that set it, a domain cookie to that domain and its
//! subdomains, and only to request paths under the cookie path.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// Longest lifetime granted through `Max-Age`, in seconds (400 days).
const MAX_AGE_CAP: i64 = 400 * 24 * 60 * 60;

/// Date layouts seen in `Expires` besides RFC 1123.
const EXPIRES_FORMATS: [&str; 3] = [
    "%a, %d-%b-%Y %H:%M:%S GMT",
    "%A, %d-%b-%y %H:%M:%S GMT",
    "%a %b %e %H:%M:%S %Y",
];

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// Domain the cookie belongs to, lower-cased, without a leading dot
    pub domain: String,
    pub path: String,
    /// Only sent over https
    pub secure: bool,
    pub http_only: bool,
    /// Set without a `Domain` attribute: sent to the origin host only
    pub host_only: bool,
    /// Expiration time (None = session cookie)
    pub expires: Option<DateTime<Utc>>,
    /// Remaining attributes (SameSite, Comment, extensions), as received
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Option<String>>,
}

impl Cookie {
    /// Create a host-only session cookie for the root path.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            secure: false,
            http_only: false,
            host_only: true,
            expires: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Scope the cookie to `domain` and its subdomains.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into().trim_start_matches('.').to_ascii_lowercase();
        self.host_only = false;
        self
    }

    /// Scope the cookie to exactly `host`.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.domain = host.into().to_ascii_lowercase();
        self.host_only = true;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.map_or(false, |exp| exp <= now)
    }

    /// Check whether the cookie should be sent with a request to `url`.
    pub fn matches(&self, url: &Url) -> bool {
        let host = match url.host_str() {
            Some(host) => host.to_ascii_lowercase(),
            None => return false,
        };

        if !self.domain_matches(&host) {
            return false;
        }
        if !path_matches(url.path(), &self.path) {
            return false;
        }
        if self.secure && url.scheme() != "https" {
            return false;
        }
        !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.host_only {
            host == self.domain
        } else {
            domain_matches(host, &self.domain)
        }
    }

    fn key(&self) -> CookieKey {
        (self.domain.clone(), self.path.clone(), self.name.clone())
    }

    /// Parse a `Set-Cookie` header value received from `url`.
    ///
    /// Returns `None` when the header is malformed or the cookie may not be
    /// set by that URL (foreign `Domain`, `Secure` over plain http).
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_ascii_lowercase();
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Cookie::new(name, value.trim()).host(host.as_str());
        cookie.path = default_path(url.path());
        let mut max_age: Option<i64> = None;

        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (attr, val) = match part.split_once('=') {
                Some((attr, val)) => (attr.trim(), Some(val.trim())),
                None => (part, None),
            };

            match (attr.to_ascii_lowercase().as_str(), val) {
                ("domain", Some(val)) => {
                    let domain = val.trim_start_matches('.').to_ascii_lowercase();
                    if domain.is_empty() {
                        continue;
                    }
                    if !domain_matches(&host, &domain) || !has_embedded_dot(&domain, &host) {
                        log::warn!(
                            "Rejecting cookie '{}': domain '{}' not allowed for host '{}'",
                            name,
                            domain,
                            host
                        );
                        return None;
                    }
                    cookie = cookie.domain(domain);
                }
                ("path", Some(val)) => {
                    if val.starts_with('/') {
                        cookie.path = val.to_string();
                    }
                }
                ("expires", Some(val)) => {
                    if let Some(expires) = parse_cookie_date(val) {
                        cookie.expires = Some(expires);
                    }
                }
                ("max-age", Some(val)) => {
                    if let Ok(secs) = val.parse::<i64>() {
                        max_age = Some(secs);
                    }
                }
                ("secure", _) => cookie.secure = true,
                ("httponly", _) => cookie.http_only = true,
                _ => {
                    cookie
                        .attributes
                        .insert(attr.to_string(), val.map(str::to_string));
                }
            }
        }

        // Max-Age wins over Expires.
        if let Some(secs) = max_age {
            cookie.expires = Some(if secs <= 0 {
                DateTime::<Utc>::MIN_UTC
            } else {
                Utc::now() + chrono::Duration::seconds(secs.min(MAX_AGE_CAP))
            });
        }

        if cookie.secure && url.scheme() != "https" {
            log::warn!("Rejecting secure cookie '{}' set over {}", name, url.scheme());
            return None;
        }

        Some(cookie)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

type CookieKey = (String, String, String);

/// Cookies keyed by (domain, path, name), iterated in that order.
#[derive(Debug, Clone, Default)]
pub struct CookieStore {
    cookies: BTreeMap<CookieKey, Cookie>,
}

impl CookieStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a cookie, returning the one it replaced.
    pub fn insert(&mut self, cookie: Cookie) -> Option<Cookie> {
        self.cookies.insert(cookie.key(), cookie)
    }

    pub fn remove(&mut self, domain: &str, path: &str, name: &str) -> Option<Cookie> {
        self.cookies
            .remove(&(domain.to_string(), path.to_string(), name.to_string()))
    }

    /// Apply one `Set-Cookie` header received from `url`.
    ///
    /// An already-expired cookie deletes the stored cookie with the same key.
    /// Returns whether the store changed.
    pub fn store_set_cookie(&mut self, header: &str, url: &Url) -> bool {
        let cookie = match Cookie::parse(header, url) {
            Some(cookie) => cookie,
            None => {
                log::debug!("Ignoring Set-Cookie from {}: {}", url, header);
                return false;
            }
        };

        if cookie.is_expired() {
            log::debug!("Cookie '{}' expired on arrival, removing", cookie.name);
            return self.cookies.remove(&cookie.key()).is_some();
        }

        log::debug!(
            "Storing cookie '{}' for {}{}",
            cookie.name,
            cookie.domain,
            cookie.path
        );
        self.insert(cookie);
        true
    }

    /// Apply every `Set-Cookie` header of a response received from `url`.
    pub fn store_response_cookies(&mut self, url: &Url, headers: &HeaderMap) -> usize {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter(|value| self.store_set_cookie(value, url))
            .count()
    }

    /// Cookies to send to `url`, longest path first.
    pub fn cookies_for(&self, url: &Url) -> Vec<&Cookie> {
        let mut matching: Vec<&Cookie> = self.cookies.values().filter(|c| c.matches(url)).collect();
        matching.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
        matching
    }

    /// Get the `Cookie` header value for `url`, dropping expired cookies first.
    pub fn header_for(&mut self, url: &Url) -> Option<String> {
        self.purge_expired();
        let cookies = self.cookies_for(url);
        if cookies.is_empty() {
            return None;
        }

        Some(
            cookies
                .iter()
                .map(|c| c.to_header_value())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Remove expired cookies, returning how many were dropped.
    pub fn purge_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.cookies.len();
        self.cookies.retain(|_, c| !c.is_expired_at(now));
        before - self.cookies.len()
    }

    /// Ordered snapshot of every stored cookie.
    pub fn cookies(&self) -> Vec<Cookie> {
        self.cookies.values().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }

    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    if host == domain {
        return true;
    }
    host.ends_with(domain)
        && host[..host.len() - domain.len()].ends_with('.')
        && host.parse::<std::net::IpAddr>().is_err()
}

/// Reject `Domain=com`-style attributes that would cover a whole TLD.
fn has_embedded_dot(domain: &str, host: &str) -> bool {
    domain == host || domain.contains('.')
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Directory of the request path (RFC 6265 section 5.1.4).
fn default_path(request_path: &str) -> String {
    if !request_path.starts_with('/') {
        return "/".to_string();
    }
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    EXPIRES_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(value, format)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}
