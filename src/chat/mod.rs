// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Chat actions for a logged-in session

mod client;

pub use client::ChatClient;
