// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Error types for sechat
//!
//! Page-shape errors (`TokenNotFound`, `AuthUrlNotFound`, ...) mean the remote
//! HTML no longer looks the way the login flow expects. They are surfaced
//! verbatim and never retried, since fetching an unchanged page again is futile.

use thiserror::Error;

/// Result type alias for sechat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sechat
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Transport-level failure not covered by reqwest
    #[error("Network error: {0}")]
    Network(String),

    /// Realtime connection error
    #[error("WebSocket error: {reason}")]
    WebSocket { reason: String, url: Option<String> },

    /// Hidden `fkey` field missing from the network login form
    #[error("unable to find fkey on the login form")]
    TokenNotFound,

    /// Login submit response carried no follow-up URL in its `<noscript>` block
    #[error("unable to find auth URL in login response")]
    AuthUrlNotFound,

    /// Chat home page carried no `#fkey` field
    #[error("unable to find chat fkey")]
    ChatTokenNotFound,

    /// Chat home page carried no `/users/<id>` profile link
    #[error("unable to find chat user ID")]
    ChatUserIdNotFound,

    /// The identity provider did not land us where a successful login does
    #[error("unexpected page redirection to '{path}' (bad credentials?)")]
    IncompleteLogin { path: String },

    /// Non-2xx response (other than an absorbed 409)
    #[error("request to {url} failed with status {status}")]
    RequestFailed { status: u16, url: String },

    /// Page script did not contain the expected call (usually no room access)
    #[error("script call '{target}' not found (no access to room?)")]
    TargetCallNotFound { target: String },

    /// Room creation response lacked a room redirect
    #[error("unable to find room ID")]
    RoomIdNotFound,

    /// CSS selector could not be parsed
    #[error("Invalid selector: {0}")]
    Selector(String),

    /// Script text could not be tokenized
    #[error("script error at offset {offset}: {message}")]
    Script { message: String, offset: usize },

    /// Image upload rejected by the server
    #[error("upload failed: {0}")]
    Upload(String),

    /// A wait was interrupted by shutdown
    #[error("operation cancelled by shutdown")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Error::Network(msg.into())
    }

    /// Create a WebSocket error
    pub fn websocket(reason: impl Into<String>) -> Self {
        Error::WebSocket {
            reason: reason.into(),
            url: None,
        }
    }

    /// Create a WebSocket error with URL
    pub fn websocket_with_url(reason: impl Into<String>, url: impl Into<String>) -> Self {
        Error::WebSocket {
            reason: reason.into(),
            url: Some(url.into()),
        }
    }

    /// Create a request failure
    pub fn request_failed(status: u16, url: impl Into<String>) -> Self {
        Error::RequestFailed {
            status,
            url: url.into(),
        }
    }

    /// Create an incomplete-login error for the path we ended up on
    pub fn incomplete_login(path: impl Into<String>) -> Self {
        Error::IncompleteLogin { path: path.into() }
    }

    /// Create a script error
    pub fn script(message: impl Into<String>, offset: usize) -> Self {
        Error::Script {
            message: message.into(),
            offset,
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a transport error
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Network(_) | Error::Http(_) | Error::WebSocket { .. }
        )
    }

    /// Check if the remote page no longer has the shape the login flow expects
    pub fn is_page_shape(&self) -> bool {
        matches!(
            self,
            Error::TokenNotFound
                | Error::AuthUrlNotFound
                | Error::ChatTokenNotFound
                | Error::ChatUserIdNotFound
        )
    }

    /// Check if this error came from a shutdown
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Get HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::RequestFailed { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get URL if available
    pub fn url(&self) -> Option<&str> {
        match self {
            Error::RequestFailed { url, .. } => Some(url),
            Error::WebSocket { url: Some(u), .. } => Some(u),
            _ => None,
        }
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for Error {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Error::websocket(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed() {
        let err = Error::request_failed(404, "https://chat.stackexchange.com/rooms/1");

        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.url(), Some("https://chat.stackexchange.com/rooms/1"));
        assert!(!err.is_network());
    }

    #[test]
    fn test_page_shape_errors() {
        assert!(Error::TokenNotFound.is_page_shape());
        assert!(Error::ChatUserIdNotFound.is_page_shape());
        assert!(!Error::incomplete_login("/users/login").is_page_shape());
    }

    #[test]
    fn test_incomplete_login_message() {
        let err = Error::incomplete_login("/users/login");
        assert_eq!(
            err.to_string(),
            "unexpected page redirection to '/users/login' (bad credentials?)"
        );
    }
}
