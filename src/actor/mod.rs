//! Actor System for Live Reload
//!
//! Message-passing concurrency for watch mode:
//!
//! ```text
//! FsActor --ReloadMsg--> ReloadActor --frame--> Broadcaster subscribers
//! (watch)               (heartbeat, reload)
//! ```
//!
//! # Module Structure
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher with debouncing
//! - `reload` - Drives the broadcaster (reloads, heartbeats, shutdown)
//! - `coordinator` - Wires up and runs actors

pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod reload;

pub use coordinator::Coordinator;
