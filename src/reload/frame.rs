//! Live Reload Frame Protocol
//!
//! Frames are Server-Sent Events: one or more `field: value` lines ended by a
//! blank line. Browsers surface `data:` payloads through
//! `EventSource.onmessage` and silently drop comment lines (`: ...`).
//!
//! # Frame Types
//!
//! - `connected`: first frame on every stream, also sets the client's
//!   reconnect delay
//! - `reload`: reload the whole page
//! - heartbeat: comment frame used to detect closed connections

/// One unit of the event-stream protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// Acknowledges a new subscription and sets a 1 s reconnect delay
    Connected,
    /// Instructs the page to reload
    Reload,
    /// Keep-alive comment, invisible to page scripts
    Heartbeat,
}

impl Frame {
    /// Wire encoding of the frame.
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::Connected => b"retry: 1000\ndata: connected\n\n",
            Self::Reload => b"data: reload\n\n",
            Self::Heartbeat => b": heartbeat\n\n",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Reload => "reload",
            Self::Heartbeat => "heartbeat",
        }
    }
}
