//! Live reload snippet injection.

use std::sync::LazyLock;

use crate::embed::serve::{LIVERELOAD_JS, LiveReloadVars};
use crate::reload::ENDPOINT;
use crate::utils::{html::find_closing_body, mime};

/// Attribute that marks the injected script tag.
pub const SNIPPET_MARKER: &str = "data-live-reload";

static SNIPPET: LazyLock<String> = LazyLock::new(|| {
    let js = LIVERELOAD_JS.render(&LiveReloadVars { endpoint: ENDPOINT });
    format!("<script {SNIPPET_MARKER}>{js}</script>")
});

/// Inject the snippet when the content is HTML and live reload is on.
pub fn maybe_inject_livereload(body: Vec<u8>, content_type: &str, enabled: bool) -> Vec<u8> {
    if enabled && mime::is_html(content_type) {
        inject_livereload(&body)
    } else {
        body
    }
}

/// Insert the snippet before the last `</body>`, or append it when there is none.
pub fn inject_livereload(content: &[u8]) -> Vec<u8> {
    let snippet = SNIPPET.as_bytes();
    let pos = find_closing_body(content).unwrap_or(content.len());

    let mut result = Vec::with_capacity(content.len() + snippet.len());
    result.extend_from_slice(&content[..pos]);
    result.extend_from_slice(snippet);
    result.extend_from_slice(&content[pos..]);
    result
}
