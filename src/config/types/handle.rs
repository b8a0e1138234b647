//! Global config handle.
//!
//! Uses `arc-swap` for lock-free reads from request workers and actors.
//! The config is stored once at startup and never replaced.

use crate::config::ServerConfig;
use arc_swap::ArcSwap;
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<ServerConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(ServerConfig::default()));

#[inline]
pub fn cfg() -> Arc<ServerConfig> {
    CONFIG.load_full()
}

#[inline]
pub fn init_config(config: ServerConfig) -> Arc<ServerConfig> {
    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}
