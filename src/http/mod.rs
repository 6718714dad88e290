// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP layer for sechat
//!
//! `HttpClient` is the anonymous transport (cookie jar, redirects, user agent).
//! `RequestExecutor` wraps it for authenticated chat requests: it attaches the
//! session `fkey` and absorbs 409 rate-limit responses.

mod client;
mod cookie;
mod executor;
mod request;
mod response;

pub use client::HttpClient;
pub use cookie::{Cookie, CookieJar};
pub use executor::{RequestExecutor, SessionToken, FKEY_FIELD};
pub use request::{FilePart, Request};
pub use response::Response;

/// Identifying user agent sent on every request
pub const DEFAULT_USER_AGENT: &str = concat!(
    "sechat/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/bountyyfi/sechat)"
);

/// Common HTTP headers
pub mod headers {
    pub const CONTENT_TYPE: &str = "content-type";
    pub const COOKIE: &str = "cookie";
    pub const SET_COOKIE: &str = "set-cookie";
    pub const LOCATION: &str = "location";
    pub const USER_AGENT: &str = "user-agent";
    pub const ORIGIN: &str = "origin";
}

/// Form content type
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
