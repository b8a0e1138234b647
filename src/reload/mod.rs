//! Live reload: the event-stream protocol and the subscriber set.
//!
//! Browsers subscribe with `EventSource` on [`ENDPOINT`]; the file watcher
//! triggers [`Broadcaster::notify_reload`] and every open tab reloads itself.

mod broadcaster;
mod frame;

pub use broadcaster::Broadcaster;

/// Path of the subscription endpoint.
pub const ENDPOINT: &str = "/live-reload";
