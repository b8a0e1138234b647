//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `serve` - Dev server resources (reload snippet, error pages)
//!
//! # Usage
//!
//! ```ignore
//! use embed::serve::{LIVERELOAD_JS, LiveReloadVars};
//!
//! let js = LIVERELOAD_JS.render(&LiveReloadVars { endpoint: "/live-reload" });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};
    use crate::utils::html::escape;

    /// Variables for livereload.js.
    pub struct LiveReloadVars<'a> {
        pub endpoint: &'a str,
    }

    impl TemplateVars for LiveReloadVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replace("__LIVE_RELOAD_ENDPOINT__", self.endpoint)
        }
    }

    /// Client listener that reloads the page on a `reload` frame.
    pub const LIVERELOAD_JS: Template<LiveReloadVars<'static>> =
        Template::new(include_str!("serve/livereload.js"));

    /// Variables for 404.html. The path is escaped on render.
    pub struct NotFoundVars<'a> {
        pub path: &'a str,
    }

    impl TemplateVars for NotFoundVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replace("__PATH__", &escape(self.path))
        }
    }

    pub const NOT_FOUND_HTML: Template<NotFoundVars<'static>> =
        Template::new(include_str!("serve/404.html"));

    /// Variables for 500.html. The message is escaped on render.
    pub struct ServerErrorVars<'a> {
        pub message: &'a str,
    }

    impl TemplateVars for ServerErrorVars<'_> {
        fn apply(&self, content: &str) -> String {
            content.replace("__MESSAGE__", &escape(self.message))
        }
    }

    pub const SERVER_ERROR_HTML: Template<ServerErrorVars<'static>> =
        Template::new(include_str!("serve/500.html"));
}
