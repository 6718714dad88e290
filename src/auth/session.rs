// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Authenticated session lifecycle

use tokio_util::sync::CancellationToken;
use url::Url;

use super::pages;
use super::state::{AuthState, Credentials};
use crate::config::{ClientConfig, Endpoints};
use crate::error::{Error, Result};
use crate::http::{
    Cookie, CookieJar, HttpClient, Request, RequestExecutor, Response, SessionToken,
};

/// Affiliate id the chat site registers with the identity provider
const AFFILIATE_ID: &str = "11";

/// Path the identity provider lands on once a login is complete
const HOME_PATH: &str = "/";

/// Path of the OpenID consent prompt
const PROMPT_PATH: &str = "/account/prompt";

/// A chat session: credentials, cookie jar and chat `fkey`.
///
/// Clones share the cookie jar and the token, so a re-login performed by the
/// event stream is visible to every executor built from any clone. The session
/// is single-writer: do not run `login()` from two tasks at once.
#[derive(Debug, Clone)]
pub struct AuthSession {
    http: HttpClient,
    endpoints: Endpoints,
    credentials: Credentials,
    token: SessionToken,
    user_id: u64,
}

impl AuthSession {
    /// Create a logged-out session
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let endpoints = config.endpoints.clone();
        Ok(Self {
            http: HttpClient::with_config(config)?,
            endpoints,
            credentials,
            token: SessionToken::default(),
            user_id: 0,
        })
    }

    /// Rebuild a session from a snapshot. The jar holds exactly the
    /// snapshot's cookies; no network call is made.
    pub fn restore(state: AuthState, config: ClientConfig) -> Result<Self> {
        let endpoints = config.endpoints.clone();
        let jar = CookieJar::from_cookies(state.cookies);
        Ok(Self {
            http: HttpClient::with_jar(config, jar)?,
            endpoints,
            credentials: Credentials::new(state.email, state.password),
            token: SessionToken::new(state.fkey),
            user_id: state.user_id,
        })
    }

    /// Run the full login workflow.
    ///
    /// Any failing step aborts the attempt and surfaces its error. Nothing is
    /// retried here; the event stream owns the retry policy.
    pub async fn login(&mut self) -> Result<()> {
        tracing::info!(email = %self.credentials.email, "logging in");

        let signin = self.fetch(Request::get(&self.endpoints.signin_url)?).await?;
        let login_url = pages::login_page_url(&signin.text_lossy(), &signin.url);
        tracing::debug!(url = %login_url, "fetched sign-in page");

        let login_page = self.fetch(Request::get(login_url)?).await?;
        let network_fkey = pages::form_fkey(&login_page.text_lossy())?;
        tracing::debug!("found network login token");

        let submit = Request::post(&self.endpoints.login_submit_url)?.form(&[
            ("email", self.credentials.email.as_str()),
            ("password", self.credentials.password.as_str()),
            ("affId", AFFILIATE_ID),
            ("fkey", network_fkey.as_str()),
        ]);
        let submitted = self.fetch(submit).await?;
        let auth_url = pages::auth_url(&submitted.text_lossy(), &submitted.url)?;
        tracing::debug!(host = ?auth_url.host_str(), "submitted credentials");

        let completed = self.fetch(Request::get(auth_url)?).await?;
        match completed.path() {
            HOME_PATH => {}
            PROMPT_PATH => self.confirm_prompt(&completed).await?,
            other => {
                tracing::warn!(path = %other, "login did not complete");
                return Err(Error::incomplete_login(other));
            }
        }

        let home = self.fetch(Request::get(self.endpoints.chat_url("/"))?).await?;
        let (fkey, user_id) = pages::chat_bootstrap(&home.text_lossy())?;
        self.token.set(fkey);
        self.user_id = user_id;

        tracing::info!(user_id, "logged in");
        Ok(())
    }

    async fn confirm_prompt(&self, prompt: &Response) -> Result<()> {
        tracing::info!("confirming OpenID prompt");
        let (session, fkey) = pages::prompt_fields(&prompt.text_lossy(), prompt.path())?;

        let request = Request::post(&self.endpoints.prompt_submit_url)?
            .form(&[("session", session.as_str()), ("fkey", fkey.as_str())]);
        let confirmed = self.fetch(request).await?;

        if confirmed.path() != HOME_PATH {
            tracing::warn!(path = %confirmed.path(), "OpenID prompt was not accepted");
            return Err(Error::incomplete_login(confirmed.path()));
        }
        Ok(())
    }

    async fn fetch(&self, request: Request) -> Result<Response> {
        let response = self.http.execute(request).await?;
        if response.status_code() >= 400 {
            tracing::warn!(url = %response.url, status = response.status_code(), "login step failed");
            return Err(Error::request_failed(response.status_code(), response.url.as_str()));
        }
        Ok(response)
    }

    /// Token present and at least one live chat cookie held. No network call.
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty() && self.chat_cookies().map_or(false, |c| !c.is_empty())
    }

    /// Value copy of the session, cookies limited to the chat host
    pub fn state(&self) -> Result<AuthState> {
        Ok(AuthState {
            email: self.credentials.email.clone(),
            password: self.credentials.password.clone(),
            fkey: self.token.get(),
            user_id: self.user_id,
            cookies: self.chat_cookies()?,
        })
    }

    fn chat_cookies(&self) -> Result<Vec<Cookie>> {
        let origin = self.chat_origin()?;
        let host = origin
            .host_str()
            .ok_or_else(|| Error::Config(format!("chat origin has no host: {}", origin)))?;
        Ok(self.http.cookie_jar().for_host(host))
    }

    /// Executor for authenticated chat requests, sharing this session's jar
    /// and token. Rate-limit waits end when `shutdown` fires.
    pub fn executor(&self, shutdown: CancellationToken) -> Result<RequestExecutor> {
        RequestExecutor::new(
            self.http.clone(),
            self.chat_origin()?,
            self.token.clone(),
            shutdown,
        )
    }

    /// Chat site origin
    pub fn chat_origin(&self) -> Result<Url> {
        self.endpoints.chat_origin_url()
    }

    /// Numeric id of the logged-in user (0 before login)
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn token(&self) -> &SessionToken {
        &self.token
    }
}
