// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Cookie jar shared by the HTTP client and the realtime connection

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// A single HTTP cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value
    pub value: String,
    /// Domain the cookie belongs to (no leading dot)
    pub domain: String,
    /// Path the cookie is valid for
    pub path: String,
    /// Expiration time (None = session cookie)
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    /// Secure flag (HTTPS only)
    #[serde(default)]
    pub secure: bool,
    /// HttpOnly flag
    #[serde(default)]
    pub http_only: bool,
}

impl Cookie {
    /// Create a new cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: String::new(),
            path: "/".to_string(),
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    /// Set the domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into().trim_start_matches('.').to_string();
        self
    }

    /// Set the path
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set secure flag
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Set expiration time
    pub fn expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Check if the cookie is expired
    pub fn is_expired(&self) -> bool {
        self.expires.map_or(false, |exp| exp < Utc::now())
    }

    /// Check if the cookie should be sent to the given URL
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("");
        if !self.domain_matches(host) {
            return false;
        }

        if !path_matches(&self.path, url.path()) {
            return false;
        }

        // ws/http are treated as their secure counterparts' plain variants
        if self.secure && !matches!(url.scheme(), "https" | "wss") {
            return false;
        }

        !self.is_expired()
    }

    fn domain_matches(&self, host: &str) -> bool {
        if self.domain.is_empty() {
            return true;
        }

        host.eq_ignore_ascii_case(&self.domain) || host.ends_with(&format!(".{}", self.domain))
    }

    /// Parse a Set-Cookie header value
    pub fn parse(header: &str, url: &Url) -> Option<Self> {
        let mut parts = header.split(';');
        let first = parts.next()?.trim();

        let (name, value) = first.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'));

        // Default domain to request host, default path to the request directory
        cookie.domain = url.host_str().unwrap_or("").to_string();
        cookie.path = default_path(url.path());

        let mut max_age = None;
        for part in parts {
            let part = part.trim();
            if let Some((attr, val)) = part.split_once('=') {
                let val = val.trim();
                match attr.trim().to_ascii_lowercase().as_str() {
                    "domain" if !val.is_empty() => {
                        cookie.domain = val.trim_start_matches('.').to_ascii_lowercase()
                    }
                    "path" if val.starts_with('/') => cookie.path = val.to_string(),
                    "expires" => {
                        if let Some(dt) = parse_cookie_date(val) {
                            cookie.expires = Some(dt);
                        }
                    }
                    "max-age" => max_age = val.parse::<i64>().ok(),
                    _ => {}
                }
            } else if part.eq_ignore_ascii_case("secure") {
                cookie.secure = true;
            } else if part.eq_ignore_ascii_case("httponly") {
                cookie.http_only = true;
            }
        }

        // Max-Age wins over Expires
        if let Some(secs) = max_age {
            cookie.expires = Some(Utc::now() + chrono::Duration::seconds(secs));
        }

        Some(cookie)
    }

    /// Convert to cookie header format
    pub fn to_header_value(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if cookie_path == request_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

fn parse_cookie_date(val: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(val) {
        return Some(dt.with_timezone(&Utc));
    }
    // Legacy "Wed, 21-Oct-2026 07:28:00 GMT" form
    chrono::NaiveDateTime::parse_from_str(val, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Thread-safe cookie storage, keyed by domain
#[derive(Debug, Clone)]
pub struct CookieJar {
    cookies: Arc<DashMap<String, Vec<Cookie>>>,
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieJar {
    /// Create a new empty cookie jar
    pub fn new() -> Self {
        Self {
            cookies: Arc::new(DashMap::new()),
        }
    }

    /// Create a jar holding exactly the given cookies
    pub fn from_cookies(cookies: impl IntoIterator<Item = Cookie>) -> Self {
        let jar = Self::new();
        for cookie in cookies {
            jar.add(cookie);
        }
        jar
    }

    /// Add a cookie, replacing any cookie with the same name and path on its domain.
    /// An already-expired cookie only deletes its predecessor.
    pub fn add(&self, cookie: Cookie) {
        let mut entry = self.cookies.entry(cookie.domain.clone()).or_default();
        entry.retain(|c| c.name != cookie.name || c.path != cookie.path);
        if !cookie.is_expired() {
            entry.push(cookie);
        }
    }

    /// Add a cookie from a Set-Cookie header
    pub fn add_from_header(&self, header: &str, url: &Url) {
        if let Some(cookie) = Cookie::parse(header, url) {
            tracing::trace!(name = %cookie.name, domain = %cookie.domain, "storing cookie");
            self.add(cookie);
        }
    }

    /// Get all cookies that should be sent to a URL, most specific path first
    pub fn get_cookies(&self, url: &Url) -> Vec<Cookie> {
        self.remove_expired();

        let mut result: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|c| c.matches(url))
            .collect();
        result.sort_by(|a, b| b.path.len().cmp(&a.path.len()).then(a.name.cmp(&b.name)));
        result
    }

    /// Get Cookie header value for a URL
    pub fn get_cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get_cookies(url);
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

    /// All cookies in deterministic (domain, path, name) order
    pub fn all(&self) -> Vec<Cookie> {
        let mut all: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        sort_cookies(&mut all);
        all
    }

    /// Live cookies whose domain covers `host`, whatever their path or
    /// secure flag, in deterministic (domain, path, name) order
    pub fn for_host(&self, host: &str) -> Vec<Cookie> {
        let mut cookies: Vec<Cookie> = self
            .cookies
            .iter()
            .flat_map(|entry| entry.value().clone())
            .filter(|c| c.domain_matches(host) && !c.is_expired())
            .collect();
        sort_cookies(&mut cookies);
        cookies
    }

    /// Clear all cookies
    pub fn clear(&self) {
        self.cookies.clear();
    }

    fn remove_expired(&self) {
        for mut entry in self.cookies.iter_mut() {
            entry.value_mut().retain(|c| !c.is_expired());
        }
    }

    /// Get total cookie count
    pub fn len(&self) -> usize {
        self.cookies.iter().map(|e| e.value().len()).sum()
    }

    /// Check if jar is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sort_cookies(cookies: &mut [Cookie]) {
    cookies.sort_by(|a, b| {
        a.domain
            .cmp(&b.domain)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_parsing() {
        let url = Url::parse("https://stackexchange.com/users/login").unwrap();
        let header = "acct=t=abc123&s=def; Domain=.stackexchange.com; Path=/; Secure; HttpOnly";
        let cookie = Cookie::parse(header, &url).unwrap();

        assert_eq!(cookie.name, "acct");
        assert_eq!(cookie.value, "t=abc123&s=def");
        assert_eq!(cookie.domain, "stackexchange.com");
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert!(cookie.http_only);
    }

    #[test]
    fn test_default_path_and_domain() {
        let url = Url::parse("https://openid.stackexchange.com/affiliate/form").unwrap();
        let cookie = Cookie::parse("anon=1", &url).unwrap();

        assert_eq!(cookie.domain, "openid.stackexchange.com");
        assert_eq!(cookie.path, "/affiliate");
    }

    #[test]
    fn test_parent_domain_matching() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("acct", "x").domain("stackexchange.com"));

        let chat = Url::parse("https://chat.stackexchange.com/").unwrap();
        let ws = Url::parse("wss://chat.sockets.stackexchange.com/events/1/abc").unwrap();
        let other = Url::parse("https://notstackexchange.com/").unwrap();

        assert_eq!(jar.get_cookies(&chat).len(), 1);
        assert_eq!(jar.get_cookies(&ws).len(), 1);
        assert!(jar.get_cookies(&other).is_empty());
    }

    #[test]
    fn test_replace_and_expire() {
        let jar = CookieJar::new();
        let url = Url::parse("https://chat.stackexchange.com/").unwrap();

        jar.add_from_header("sid=1; Path=/", &url);
        jar.add_from_header("sid=2; Path=/", &url);
        assert_eq!(jar.len(), 1);
        assert_eq!(jar.get_cookie_header(&url), Some("sid=2".to_string()));

        jar.add_from_header("sid=gone; Path=/; Max-Age=0", &url);
        jar.add_from_header("old=1; Expires=Thu, 01 Jan 1970 00:00:00 GMT", &url);
        assert!(jar.get_cookie_header(&url).is_none());
    }

    #[test]
    fn test_secure_cookie_not_sent_over_http() {
        let jar = CookieJar::new();
        jar.add(Cookie::new("s", "1").domain("example.com").secure(true));

        let http = Url::parse("http://example.com/").unwrap();
        let https = Url::parse("https://example.com/").unwrap();
        assert!(jar.get_cookies(&http).is_empty());
        assert_eq!(jar.get_cookies(&https).len(), 1);
    }

    #[test]
    fn test_for_host_keeps_scoped_cookies() {
        let chat = Url::parse("https://chat.stackexchange.com/").unwrap();
        let rooms = Url::parse("https://chat.stackexchange.com/rooms/1").unwrap();
        let jar = CookieJar::new();
        jar.add_from_header("acct=1; Domain=.stackexchange.com; Path=/", &chat);
        jar.add_from_header("roompref=2; Path=/rooms; Secure", &rooms);
        jar.add(Cookie::new("idp", "3").domain("openid.stackexchange.com"));
        // expired but not yet purged
        jar.cookies
            .entry("chat.stackexchange.com".to_string())
            .or_default()
            .push(
                Cookie::new("old", "4")
                    .domain("chat.stackexchange.com")
                    .expires(Utc::now() - chrono::Duration::seconds(5)),
            );

        let kept = jar.for_host("chat.stackexchange.com");
        let names: Vec<_> = kept.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["roompref", "acct"]);
        assert_eq!(kept[0].path, "/rooms");
        assert!(kept[0].secure);
    }

    #[test]
    fn test_deterministic_order() {
        let jar = CookieJar::from_cookies(vec![
            Cookie::new("b", "2").domain("b.example"),
            Cookie::new("z", "1").domain("a.example"),
            Cookie::new("a", "1").domain("a.example"),
        ]);

        let names: Vec<_> = jar.all().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["a", "z", "b"]);
    }
}
