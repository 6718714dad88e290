// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Realtime event stream
//!
//! A single background task owns the websocket connection: it authenticates,
//! connects, decodes frames into [`Event`](crate::model::Event)s and, whenever
//! anything fails, waits a fixed delay and starts over. It only stops when the
//! stream is closed.

mod event_stream;
mod frame;

pub use event_stream::EventStream;
pub use frame::decode_frame;

/// Connectivity of the background task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// Not connected; initial state and the state during a retry wait
    Disconnected,
    /// Running the login workflow
    Authenticating,
    /// Requesting the realtime URL and opening the websocket
    Connecting,
    /// Websocket open, events flowing
    Connected,
    /// Task exited; no further events
    Closed,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Authenticating => "authenticating",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Closed => "closed",
        };
        f.write_str(s)
    }
}
