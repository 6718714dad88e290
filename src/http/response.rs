// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP response types

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use super::headers;
use crate::error::Result;

/// HTTP response representation
#[derive(Debug, Clone)]
pub struct Response {
    /// Response status code
    pub status: StatusCode,
    /// Response headers
    pub headers: HeaderMap,
    /// Response body
    pub body: Bytes,
    /// Final URL (after redirects)
    pub url: Url,
    /// Whether any redirect was followed
    pub redirected: bool,
}

impl Response {
    /// Create a new response
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
        url: Url,
        redirected: bool,
    ) -> Self {
        Self {
            status,
            headers,
            body,
            url,
            redirected,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Body decoded as UTF-8; invalid sequences become U+FFFD
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode a JSON body
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Redirect target, resolved against the response URL
    pub fn location(&self) -> Option<Url> {
        self.headers
            .get(headers::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|loc| self.url.join(loc).ok())
    }

    /// Path of the final URL
    pub fn path(&self) -> &str {
        self.url.path()
    }
}
