// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! HTML parsing and querying
//!
//! Thin layer over html5ever for the handful of queries the login flow and
//! the chat facade need. Documents hold `Rc` handles and are not `Send`:
//! parse, query, and drop them before the next `.await`.

mod document;
mod selector;

pub use document::{strip_html, Document, Element};
pub use selector::Selector;
