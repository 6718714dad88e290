// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTTP client implementation


use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Method, StatusCode};

use super::cookie::CookieJar;
use super::request::Request;
use super::response::Response;
use super::headers;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// HTTP client with its own cookie jar.
///
/// Redirects are followed here rather than inside reqwest so that every hop's
/// `Set-Cookie` headers land in the jar and every hop carries the jar's cookies.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
    cookie_jar: CookieJar,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.config.user_agent)
            .field("cookies", &self.cookie_jar.len())
            .finish()
    }
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_jar(config, CookieJar::new())
    }

    /// Create a client around an existing cookie jar
    pub fn with_jar(config: ClientConfig, cookie_jar: CookieJar) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            "accept",
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8",
            ),
        );

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(Policy::none())
            .default_headers(default_headers);

        if let Some(ref proxy_url) = config.proxy {
            builder = builder.proxy(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?,
            );
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            config,
            cookie_jar,
        })
    }

    /// Get the cookie jar
    pub fn cookie_jar(&self) -> &CookieJar {
        &self.cookie_jar
    }

    /// Get client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Execute a GET request
    pub async fn get(&self, url: impl AsRef<str>) -> Result<Response> {
        self.execute(Request::get(url)?).await
    }

    /// Execute a request, following redirects if the request asks for it
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut current = request;
        let mut hops = 0usize;

        loop {
            let response = self.send_once(&current).await?;

            if !current.follow_redirects || !response.status().is_redirection() {
                return self.finish(response, hops > 0).await;
            }

            let Some(next_url) = response
                .headers()
                .get(headers::LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|loc| response.url().join(loc).ok())
            else {
                return self.finish(response, hops > 0).await;
            };

            hops += 1;
            if hops > self.config.max_redirects {
                return Err(Error::network(format!(
                    "too many redirects (max {}) at {}",
                    self.config.max_redirects, next_url
                )));
            }

            tracing::debug!(
                status = response.status().as_u16(),
                from = %response.url(),
                to = %next_url,
                "following redirect"
            );
            current = redirect_request(current, response.status(), next_url);
        }
    }

    async fn send_once(&self, request: &Request) -> Result<reqwest::Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());

        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }

        if let Some(cookie_header) = self.cookie_jar.get_cookie_header(&request.url) {
            builder = builder.header(headers::COOKIE, cookie_header);
        }

        if let Some(ref file) = request.file {
            let mut part = reqwest::multipart::Part::bytes(file.data.to_vec())
                .file_name(file.file_name.clone());
            if let Some(ref mime) = file.mime {
                part = part.mime_str(mime)?;
            }
            builder = builder.multipart(reqwest::multipart::Form::new().part(file.field.clone(), part));
        } else if let Some(ref body) = request.body {
            builder = builder.body(body.clone());
        }

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        tracing::trace!(method = %request.method, url = %request.url, "sending request");
        let response = builder.send().await?;

        // Process Set-Cookie headers on every hop
        for cookie in response.headers().get_all(headers::SET_COOKIE) {
            if let Ok(cookie_str) = cookie.to_str() {
                self.cookie_jar.add_from_header(cookie_str, response.url());
            }
        }

        Ok(response)
    }

    async fn finish(
        &self,
        response: reqwest::Response,
        redirected: bool,
    ) -> Result<Response> {
        let final_url = response.url().clone();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(Response::new(
            status,
            headers,
            body,
            final_url,
            redirected,
        ))
    }
}

/// Build the request for the next redirect hop
fn redirect_request(previous: Request, status: StatusCode, next_url: url::Url) -> Request {
    let becomes_get = match status {
        StatusCode::SEE_OTHER => previous.method != Method::HEAD,
        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND => previous.method == Method::POST,
        _ => false,
    };

    let mut next = previous;
    next.url = next_url;
    if becomes_get {
        next.method = Method::GET;
        next.body = None;
        next.file = None;
        next.headers.remove(headers::CONTENT_TYPE);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = HttpClient::new().unwrap();
        assert_eq!(client.config().user_agent, super::super::DEFAULT_USER_AGENT);
        assert!(client.cookie_jar().is_empty());
    }

    #[test]
    fn test_redirect_method_rewrite() {
        let url = url::Url::parse("https://chat.stackexchange.com/rooms/save").unwrap();
        let post = Request::from_url(Method::POST, url.clone()).form(&[("name", "x")]);

        let next = redirect_request(post.clone(), StatusCode::FOUND, url.join("/").unwrap());
        assert_eq!(next.method, Method::GET);
        assert!(next.body.is_none());
        assert!(next.headers.get("content-type").is_none());

        let next = redirect_request(post, StatusCode::TEMPORARY_REDIRECT, url.join("/").unwrap());
        assert_eq!(next.method, Method::POST);
        assert!(next.body.is_some());
    }

    #[tokio::test]
    async fn test_redirect_carries_cookies() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/complete"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", "/")
                    .insert_header("set-cookie", "acct=t%3D1; Path=/"),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/"))
            .and(header("cookie", "acct=t%3D1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("home"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let resp = client
            .get(format!("{}/auth/complete", server.uri()))
            .await
            .unwrap();

        assert_eq!(resp.status_code(), 200);
        assert_eq!(resp.path(), "/");
        assert!(resp.redirected);
        assert_eq!(resp.text_lossy(), "home");
    }

    #[tokio::test]
    async fn test_redirect_not_followed_when_disabled() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rooms/save"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/rooms/info/7/x"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = Request::post(format!("{}/rooms/save", server.uri()))
            .unwrap()
            .follow_redirects(false);
        let resp = client.execute(request).await.unwrap();

        assert_eq!(resp.status_code(), 302);
        assert_eq!(resp.location().unwrap().path(), "/rooms/info/7/x");
    }

    #[tokio::test]
    async fn test_redirect_loop_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get(format!("{}/loop", server.uri()))
            .await
            .unwrap_err();
        assert!(err.is_network());
    }
}
