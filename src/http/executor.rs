// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Authenticated request execution with rate-limit absorption

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use regex::Regex;
use reqwest::Method;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::client::HttpClient;
use super::request::{FilePart, Request};
use super::response::Response;
use crate::error::{Error, Result};

/// Form field carrying the anti-forgery token
pub const FKEY_FIELD: &str = "fkey";

/// The chat `fkey`, shared between the session that obtains it and the
/// executors that attach it. A re-login updates every holder at once.
#[derive(Debug, Clone, Default)]
pub struct SessionToken {
    inner: Arc<RwLock<String>>,
}

impl SessionToken {
    /// Create a token holder with an initial value
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value.into())),
        }
    }

    /// Current token value
    pub fn get(&self) -> String {
        self.inner.read().clone()
    }

    /// Replace the token value
    pub fn set(&self, value: impl Into<String>) {
        *self.inner.write() = value.into();
    }

    /// Check whether a token has been obtained
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Executes chat requests on behalf of a logged-in session.
///
/// POSTs get the session `fkey` appended. A 409 response is the server's
/// throttle: the first integer in its body is the number of seconds to wait,
/// after which the identical request is sent again. The wait ends early with
/// `Error::Cancelled` when the shutdown token fires.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    http: HttpClient,
    base: Url,
    token: SessionToken,
    shutdown: CancellationToken,
    wait_pattern: Regex,
}

impl RequestExecutor {
    /// Create an executor resolving relative paths against `base`
    pub fn new(
        http: HttpClient,
        base: Url,
        token: SessionToken,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let wait_pattern = Regex::new(r"\d+").map_err(|e| Error::other(e.to_string()))?;
        Ok(Self {
            http,
            base,
            token,
            shutdown,
            wait_pattern,
        })
    }

    /// Underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Shared session token
    pub fn token(&self) -> &SessionToken {
        &self.token
    }

    /// Resolve a chat path (or absolute URL) against the base
    pub fn url(&self, path: &str) -> Result<Url> {
        self.base.join(path).map_err(Error::from)
    }

    /// GET a chat path
    pub async fn get(&self, path: &str) -> Result<Response> {
        let request = Request::from_url(Method::GET, self.url(path)?);
        self.execute(request).await
    }

    /// POST a form to a chat path with the session `fkey` appended
    pub async fn post_form(&self, path: &str, fields: &[(&str, String)]) -> Result<Response> {
        let request = self.form_request(path, fields)?;
        self.execute(request).await
    }

    /// Build a form POST with the session `fkey` appended, without sending it
    pub fn form_request(&self, path: &str, fields: &[(&str, String)]) -> Result<Request> {
        let token = self.token.get();
        let mut all: Vec<(&str, &str)> = fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        all.push((FKEY_FIELD, token.as_str()));
        Ok(Request::from_url(Method::POST, self.url(path)?).form(&all))
    }

    /// POST a single file as multipart form data
    pub async fn upload(&self, path: &str, part: FilePart) -> Result<Response> {
        let request = Request::from_url(Method::POST, self.url(path)?).file(part);
        self.execute(request).await
    }

    /// Send a request, absorbing 409 throttles.
    ///
    /// Returns 2xx and 3xx responses; any other status >= 400 becomes
    /// `Error::RequestFailed`.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        loop {
            if self.shutdown.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let response = self.http.execute(request.clone()).await?;
            let status = response.status_code();

            if status == 409 {
                let body = response.text_lossy();
                let Some(wait_secs) = self.retry_after(&body) else {
                    tracing::warn!(url = %request.url, "409 without a wait time");
                    return Err(Error::request_failed(status, request.url_str()));
                };

                tracing::info!(
                    url = %request.url,
                    wait_secs,
                    "rate limited; retrying in {}s",
                    wait_secs
                );

                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(wait_secs)) => continue,
                    _ = self.shutdown.cancelled() => return Err(Error::Cancelled),
                }
            }

            if status >= 400 {
                return Err(Error::request_failed(status, response.url.as_str()));
            }

            return Ok(response);
        }
    }

    /// First integer in a throttle body
    fn retry_after(&self, body: &str) -> Option<u64> {
        self.wait_pattern
            .find(body)
            .and_then(|m| m.as_str().parse().ok())
    }
}
