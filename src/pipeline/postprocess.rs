//! Post-processing: generic CommonMark HTML → WordPress dialect HTML.
//!
//! The parser's output is valid but plain. The publishing site wants its own
//! dialect on top of it:
//!
//! - code blocks as `<pre lang="…">` for the syntax highlighter plugin
//! - alignment classes on images (the first one is the post's avatar)
//! - links opening in a new tab
//! - no `<p>` wrappers, since the editor inserts paragraphs itself
//! - `<em>` instead of `<strong>`
//! - `<div class="note">` for note callouts and `[spoiler]` shortcodes for
//!   solution callouts
//!
//! ## Stage Order
//!
//! Stages run in the order of [`STAGES`]. Later stages see the output of
//! earlier ones, e.g. callout detection runs after `<p>` flattening and
//! `<strong>` remapping. Every stage is a pure `&str → String` function so it
//! can be tested on its own.
//!
//! Text-only stages are literal substring substitutions. The attribute stages
//! and callout detection go through a streaming rewriter so only the targeted
//! tags change; everything else is passed through byte for byte.

use lol_html::html_content::ContentType;
use lol_html::{element, ElementContentHandlers, HtmlRewriter, Selector as RewriteSelector, Settings};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::borrow::Cow;
use tracing::{trace, warn};

/// Line break inserted by the spacing stages.
pub const LINE_BREAK: &str = "\n";

/// Class given to the first image of a post (the 250×250 avatar).
pub const HERO_IMAGE_CLASS: &str = "alignright size-full";

/// Class given to every later image.
pub const INLINE_IMAGE_CLASS: &str = "aligncenter size-full";

/// Shortcode opening a spoiler callout.
pub const SPOILER_OPEN: &str = "[spoiler title=\"Solution\"]";

/// Shortcode closing a spoiler callout.
pub const SPOILER_CLOSE: &str = "[/spoiler]";

/// A named post-processing stage.
pub struct Stage {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

/// All stages, in the order [`post_process`] applies them.
pub const STAGES: [Stage; 9] = [
    Stage {
        name: "code blocks",
        apply: normalise_code_blocks,
    },
    Stage {
        name: "image classes",
        apply: tag_images,
    },
    Stage {
        name: "link targets",
        apply: tag_links,
    },
    Stage {
        name: "paragraphs",
        apply: flatten_paragraphs,
    },
    Stage {
        name: "heading spacing",
        apply: space_headings,
    },
    Stage {
        name: "emphasis",
        apply: remap_emphasis,
    },
    Stage {
        name: "list spacing",
        apply: space_lists,
    },
    Stage {
        name: "callouts",
        apply: remap_callouts,
    },
    Stage {
        name: "cleanup",
        apply: cleanup,
    },
];

/// Convert parser HTML into the WordPress dialect.
///
/// Deterministic: the same input always yields byte-identical output.
pub fn post_process(html: &str) -> String {
    STAGES.iter().fold(html.to_string(), |doc, stage| {
        let next = (stage.apply)(&doc);
        trace!(stage = stage.name, before = doc.len(), after = next.len(), "stage applied");
        next
    })
}

// ── Stage 1: Code blocks ─────────────────────────────────────────────────────

static RE_CODE_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<pre><code class="(?:lang-|language-)*([^"]*)">"#).unwrap()
});

fn normalise_code_blocks(html: &str) -> String {
    let with_lang = RE_CODE_OPEN.replace_all(html, format!("{LINE_BREAK}<pre lang=\"${{1}}\">"));
    with_lang
        .replace("<pre><code>", &format!("{LINE_BREAK}<pre>"))
        .replace("</code></pre>", &format!("</pre>{LINE_BREAK}"))
}

// ── Stage 2: Image classes ───────────────────────────────────────────────────

fn tag_images(html: &str) -> String {
    let mut position = 0usize;
    rewrite(
        html,
        "image classes",
        vec![element!("img", |el| {
            let class = if position == 0 {
                HERO_IMAGE_CLASS
            } else {
                INLINE_IMAGE_CLASS
            };
            position += 1;
            el.set_attribute("class", class)?;
            Ok(())
        })],
    )
}

// ── Stage 3: Link targets ────────────────────────────────────────────────────

fn tag_links(html: &str) -> String {
    rewrite(
        html,
        "link targets",
        vec![element!("a", |el| {
            el.set_attribute("rel", "noopener")?;
            el.set_attribute("target", "_blank")?;
            Ok(())
        })],
    )
}

// ── Stage 4: Paragraphs and line breaks ──────────────────────────────────────

fn flatten_paragraphs(html: &str) -> String {
    html.replace("<p>", LINE_BREAK)
        .replace("</p>", "")
        .replace("<br />", LINE_BREAK)
        .replace("<br/>", LINE_BREAK)
        .replace("<br>", LINE_BREAK)
}

// ── Stage 5: Heading spacing ─────────────────────────────────────────────────

fn space_headings(html: &str) -> String {
    ["<h1", "<h2", "<h3", "<h4"]
        .iter()
        .fold(html.to_string(), |doc, tag| {
            doc.replace(tag, &format!("{LINE_BREAK}{tag}"))
        })
}

// ── Stage 6: Emphasis ────────────────────────────────────────────────────────

fn remap_emphasis(html: &str) -> String {
    html.replace("<strong>", "<em>").replace("</strong>", "</em>")
}

// ── Stage 7: List spacing ────────────────────────────────────────────────────

fn space_lists(html: &str) -> String {
    html.replace("<ul>", &format!("{LINE_BREAK}<ul>"))
        .replace("<ol", &format!("{LINE_BREAK}<ol"))
}

// ── Stage 8: Callouts ────────────────────────────────────────────────────────

/// What a `<blockquote>` turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callout {
    /// A bare `<div>`.
    Plain,
    /// `<div class="note">`.
    Note,
    /// A `[spoiler]` shortcode pair.
    Spoiler,
}

static BLOCKQUOTE: Lazy<Selector> = Lazy::new(|| Selector::parse("blockquote").unwrap());

/// Classify every `<blockquote>` in document order.
///
/// A blockquote is a note or spoiler when its first meaningful child (after
/// skipping whitespace and stepping into a leading `<p>`) is an `<em>` or
/// `<strong>` whose text starts with `Note` or `Spoiler`.
pub fn classify_callouts(html: &str) -> Vec<Callout> {
    let fragment = Html::parse_fragment(html);
    fragment.select(&BLOCKQUOTE).map(classify).collect()
}

fn classify(blockquote: ElementRef<'_>) -> Callout {
    match leading_emphasis(blockquote) {
        Some(text) if text.starts_with("Note") => Callout::Note,
        Some(text) if text.starts_with("Spoiler") => Callout::Spoiler,
        _ => Callout::Plain,
    }
}

fn leading_emphasis(parent: ElementRef<'_>) -> Option<String> {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) if text.trim().is_empty() => continue,
            Node::Comment(_) => continue,
            Node::Element(_) => {
                let el = ElementRef::wrap(child)?;
                return match el.value().name() {
                    "em" | "strong" => Some(el.text().collect()),
                    "p" => leading_emphasis(el),
                    _ => None,
                };
            }
            _ => return None,
        }
    }
    None
}

fn remap_callouts(html: &str) -> String {
    let html = html.replace(
        &format!("<blockquote>{LINE_BREAK}"),
        &format!("{LINE_BREAK}<blockquote>"),
    );
    let kinds = classify_callouts(&html);
    let mut position = 0usize;

    rewrite(
        &html,
        "callouts",
        vec![element!("blockquote", move |el| {
            let kind = kinds.get(position).copied().unwrap_or(Callout::Plain);
            position += 1;
            match kind {
                Callout::Plain => el.set_tag_name("div")?,
                Callout::Note => {
                    el.set_tag_name("div")?;
                    el.set_attribute("class", "note")?;
                }
                Callout::Spoiler => {
                    el.before(SPOILER_OPEN, ContentType::Html);
                    el.after(SPOILER_CLOSE, ContentType::Html);
                    el.remove_and_keep_content();
                }
            }
            Ok(())
        })],
    )
}

// ── Stage 9: Cleanup ─────────────────────────────────────────────────────────

fn cleanup(html: &str) -> String {
    html.replace("<div></div>", "").trim().to_string()
}

// ── Rewriter plumbing ────────────────────────────────────────────────────────

type Handlers<'a> = Vec<(Cow<'a, RewriteSelector>, ElementContentHandlers<'a>)>;

/// Run `handlers` over `html` with a streaming rewriter.
///
/// Rewriting only fails on resource limits or handler errors. Either way the
/// stage is skipped and its input returned unchanged.
fn rewrite<'a>(html: &str, stage: &str, handlers: Handlers<'a>) -> String {
    let mut output = Vec::with_capacity(html.len() + 64);
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );

    let result = rewriter.write(html.as_bytes()).and_then(|()| rewriter.end());
    if let Err(e) = result {
        warn!(stage, "HTML rewrite failed, stage skipped: {e}");
        return html.to_string();
    }

    match String::from_utf8(output) {
        Ok(s) => s,
        Err(e) => {
            warn!(stage, "Rewritten HTML is not UTF-8, stage skipped: {e}");
            html.to_string()
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
