//! Configuration section definitions.
//!
//! Each module corresponds to a section in `liveserve.toml`:
//!
//! | Module  | TOML Section | Purpose                               |
//! |---------|--------------|---------------------------------------|
//! | `serve` | `[serve]`    | Address, served root, request workers |
//! | `watch` | `[watch]`    | File watcher and reload triggers      |

mod serve;
mod watch;

pub use serve::ServeConfig;
pub use watch::WatchConfig;
