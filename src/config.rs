// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Client, endpoint and event stream configuration

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::http::DEFAULT_USER_AGENT;

/// Sentinel "last seen event" id: asks the server to treat all history as seen
pub const LAST_EVENT_SENTINEL: u64 = 999_999_999_999;

/// Remote endpoints used by the login flow and the chat facade
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Identity provider sign-in page
    pub signin_url: String,
    /// Affiliate login form submit endpoint
    pub login_submit_url: String,
    /// OpenID consent prompt submit endpoint
    pub prompt_submit_url: String,
    /// Chat site origin (scheme + host, no trailing slash)
    pub chat_origin: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            signin_url: "https://stackexchange.com/users/signin".to_string(),
            login_submit_url: "https://openid.stackexchange.com/affiliate/form/login/submit"
                .to_string(),
            prompt_submit_url: "https://openid.stackexchange.com/account/prompt/submit"
                .to_string(),
            chat_origin: "https://chat.stackexchange.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Create endpoints for the public Stack Exchange network
    pub fn new() -> Self {
        Self::default()
    }

    /// Point every endpoint at a single base URL (mock servers, staging)
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            signin_url: format!("{}/users/signin", base),
            login_submit_url: format!("{}/affiliate/form/login/submit", base),
            prompt_submit_url: format!("{}/account/prompt/submit", base),
            chat_origin: base.to_string(),
        }
    }

    /// Set the chat origin
    pub fn chat_origin(mut self, origin: impl Into<String>) -> Self {
        self.chat_origin = origin.into().trim_end_matches('/').to_string();
        self
    }

    /// Absolute URL for a path on the chat site
    pub fn chat_url(&self, path: &str) -> String {
        format!("{}{}", self.chat_origin, path)
    }

    /// Parsed chat origin
    pub fn chat_origin_url(&self) -> Result<Url> {
        Url::parse(&self.chat_origin).map_err(Error::from)
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// User agent sent on every request
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum redirects to follow
    pub max_redirects: usize,
    /// Proxy URL
    pub proxy: Option<String>,
    /// Remote endpoints
    pub endpoints: Endpoints,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            max_redirects: 10,
            proxy: None,
            endpoints: Endpoints::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new client config
    pub fn new() -> Self {
        Self::default()
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set proxy
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set endpoints
    pub fn endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }
}

/// How the stream task hands events to the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Task waits until the consumer has room for the next event
    #[default]
    Blocking,
    /// Events that do not fit in the channel are dropped and counted
    BestEffort,
}

/// Event stream configuration
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Room whose events the realtime endpoint is scoped to
    pub room_id: u64,
    /// Fixed wait between reconnect attempts
    pub retry_delay: Duration,
    /// Value sent as `l=` on the realtime URL
    pub last_event_id: u64,
    /// Delivery policy
    pub delivery: DeliveryMode,
    /// Consumer channel capacity
    pub channel_capacity: usize,
}

impl StreamConfig {
    /// Create a config observing a single room
    pub fn new(room_id: u64) -> Self {
        Self {
            room_id,
            retry_delay: Duration::from_secs(30),
            last_event_id: LAST_EVENT_SENTINEL,
            delivery: DeliveryMode::Blocking,
            channel_capacity: 1,
        }
    }

    /// Set the reconnect delay
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set the delivery policy
    pub fn delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    /// Set the consumer channel capacity (minimum 1)
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Best-effort delivery with a roomy buffer
    pub fn best_effort(room_id: u64, capacity: usize) -> Self {
        Self::new(room_id)
            .delivery(DeliveryMode::BestEffort)
            .channel_capacity(capacity)
    }
}
