// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP request types

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use super::FORM_CONTENT_TYPE;
use crate::error::Result;

/// A single file part of a multipart upload
#[derive(Debug, Clone)]
pub struct FilePart {
    /// Form field name
    pub field: String,
    /// File name reported to the server
    pub file_name: String,
    /// MIME type of the file
    pub mime: Option<String>,
    /// File contents
    pub data: Bytes,
}

/// HTTP request representation.
///
/// Requests are plain data so that a throttled request can be replayed
/// exactly as it was first sent.
#[derive(Debug, Clone)]
pub struct Request {
    /// Request method
    pub method: Method,
    /// Request URL
    pub url: Url,
    /// Request headers
    pub headers: HeaderMap,
    /// Request body
    pub body: Option<Bytes>,
    /// Multipart file part (replaces `body` when set)
    pub file: Option<FilePart>,
    /// Request timeout
    pub timeout: Option<Duration>,
    /// Follow redirects
    pub follow_redirects: bool,
}

impl Request {
    /// Create a new request with arbitrary method
    pub fn new(method: Method, url: impl AsRef<str>) -> Result<Self> {
        Ok(Self::from_url(method, Url::parse(url.as_ref())?))
    }

    /// Create a request for an already parsed URL
    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            file: None,
            timeout: None,
            follow_redirects: true,
        }
    }

    /// Create a new GET request
    pub fn get(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::GET, url)
    }

    /// Create a new POST request
    pub fn post(url: impl AsRef<str>) -> Result<Self> {
        Self::new(Method::POST, url)
    }

    /// Set a header
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Set the request body
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a urlencoded form body. Field order is preserved.
    pub fn form<K, V>(mut self, fields: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            serializer.append_pair(key.as_ref(), value.as_ref());
        }
        self.body = Some(Bytes::from(serializer.finish()));
        self.header("content-type", FORM_CONTENT_TYPE)
    }

    /// Attach a file as a multipart form body
    pub fn file(mut self, part: FilePart) -> Self {
        self.body = None;
        self.file = Some(part);
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set follow redirects
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Get the URL as string
    pub fn url_str(&self) -> &str {
        self.url.as_str()
    }

    /// Decoded form fields of the body, if it is urlencoded
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let is_form = self
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map_or(false, |ct| ct.starts_with(FORM_CONTENT_TYPE));

        match (&self.body, is_form) {
            (Some(body), true) => url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_creation() {
        let req = Request::get("https://chat.stackexchange.com/rooms/1").unwrap();
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.url.host_str(), Some("chat.stackexchange.com"));
        assert!(req.follow_redirects);
    }

    #[test]
    fn test_form_encoding() {
        let req = Request::post("https://chat.stackexchange.com/chats/1/messages/new")
            .unwrap()
            .form(&[("text", "hello world & more"), ("fkey", "abc")]);

        let body = req.body.clone().unwrap();
        assert_eq!(&body[..], b"text=hello+world+%26+more&fkey=abc");
        assert_eq!(
            req.form_fields(),
            vec![
                ("text".to_string(), "hello world & more".to_string()),
                ("fkey".to_string(), "abc".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(Request::get("not a url").is_err());
    }
}
