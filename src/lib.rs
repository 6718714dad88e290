// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # sechat - Stack Exchange chat client
//!
//! A client for a chat service that offers no public API: sessions come from
//! replaying the identity provider's HTML login flow, some data is only
//! available as literals inside page scripts, and events arrive over a
//! websocket that has to be kept alive by hand.
//!
//! ## Features
//!
//! - Scripted login: sign-in page, form token, `<noscript>` continuation, OpenID prompt
//! - Session snapshots: save cookies and `fkey` to JSON, restore without logging in
//! - Throttle handling: 409 cooldowns are waited out and the request replayed
//! - Script extraction: room occupants read from `$(function(){...})` blocks
//! - Event stream: websocket supervisor with per-frame dedup and fixed-delay reconnects
//! - Chat actions: send, reply, star, join, leave, invite, rooms, users, image upload
//!
//! ## Example
//!
//! ```rust,no_run
//! use sechat::{AuthSession, ChatClient, ClientConfig, Credentials, StreamConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("me@example.com", "secret");
//!     let mut session = AuthSession::new(credentials, ClientConfig::default())?;
//!     session.login().await?;
//!
//!     let client = ChatClient::new(session)?;
//!     let mut stream = client.stream(StreamConfig::new(1))?;
//!
//!     while let Some(event) = stream.recv().await {
//!         if event.is_mention {
//!             client.reply(&event, "pong").await?;
//!         }
//!     }
//!
//!     stream.close().await;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod html;
pub mod http;
pub mod model;
pub mod script;
pub mod stream;

// Re-exports for convenience

// Session
pub use auth::{AuthSession, AuthState, Credentials};

// Chat
pub use chat::ChatClient;

// Configuration
pub use config::{ClientConfig, DeliveryMode, Endpoints, StreamConfig, LAST_EVENT_SENTINEL};

// Errors
pub use error::{Error, Result};

// HTTP
pub use http::{Cookie, CookieJar, HttpClient, Request, RequestExecutor, Response, SessionToken};

// Records
pub use model::{Access, Event, EventType, Room, Site, User};

// Script extraction
pub use script::{FromScriptMap, ScriptExtractor, ScriptMap, ScriptValue, ROOM_USERS_TARGET};

// Events
pub use stream::{ConnectionStatus, EventStream};

/// sechat version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
