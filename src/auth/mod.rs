// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Login workflow and session snapshots
//!
//! `AuthSession` drives the identity provider's scripted login (sign-in page,
//! network fkey, credential submit, `<noscript>` continuation link, optional
//! OpenID consent prompt, chat bootstrap) and owns the resulting cookies and
//! chat `fkey`. `AuthState` is the serializable value copy of that session.

mod pages;
mod session;
mod state;

pub use session::AuthSession;
pub use state::{AuthState, Credentials};
