//! HTML helpers used by error pages and the content rewriter.

use std::borrow::Cow;

/// Escape the five HTML-significant characters.
///
/// Borrows the input when nothing needs escaping.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Byte offset of the last `</body>` tag, matched ASCII case-insensitively.
///
/// Works on raw bytes so documents that are not valid UTF-8 can still be
/// rewritten.
pub fn find_closing_body(content: &[u8]) -> Option<usize> {
    const PATTERN: &[u8] = b"</body>";

    content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
}
