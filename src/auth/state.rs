// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Persistable authentication state

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::http::Cookie;

/// Account credentials
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Snapshot of a session, suitable for persisting between runs.
///
/// A value copy: later changes to the live session do not show up here.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub email: String,
    pub password: String,
    /// Chat anti-forgery token
    #[serde(default)]
    pub fkey: String,
    #[serde(default)]
    pub user_id: u64,
    /// Cookies applicable to the chat origin, in (domain, path, name) order
    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

impl std::fmt::Debug for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthState")
            .field("email", &self.email)
            .field("user_id", &self.user_id)
            .field("has_fkey", &!self.fkey.is_empty())
            .field("cookies", &self.cookies.len())
            .finish()
    }
}

impl AuthState {
    /// Fresh, logged-out state for an account
    pub fn new(credentials: Credentials) -> Self {
        Self {
            email: credentials.email,
            password: credentials.password,
            ..Self::default()
        }
    }

    /// Cheap liveness check: a token and at least one cookie.
    /// A revoked session still reports true until a request fails.
    pub fn is_logged_in(&self) -> bool {
        !self.fkey.is_empty() && !self.cookies.is_empty()
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the snapshot to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a snapshot written by [`AuthState::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
