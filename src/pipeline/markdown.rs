//! Markdown parsing: CommonMark text → generic HTML with entities decoded.
//!
//! Only the CommonMark core is enabled. Tables, strikethrough and friends
//! would produce markup the post-processor has no dialect rules for.
//!
//! The parser escapes `<`, `>`, `&` and `"` in text and code. WordPress code
//! blocks expect the raw characters, so the whole fragment is entity-decoded
//! before it reaches [`super::postprocess`].

use pulldown_cmark::{html, Options, Parser};
use tracing::debug;

/// Render `markdown` to an HTML fragment and decode its entities.
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);

    let decoded = html_escape::decode_html_entities(&out).into_owned();
    debug!(
        "Rendered {} bytes of Markdown into {} bytes of HTML",
        markdown.len(),
        decoded.len()
    );
    decoded
}

/// Replace every tab with `width` spaces.
pub fn expand_tabs(markdown: &str, width: usize) -> String {
    markdown.replace('\t', &" ".repeat(width))
}
