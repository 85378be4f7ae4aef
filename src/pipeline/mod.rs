//! Pipeline stages for Markdown-to-WordPress conversion.
//!
//! Each submodule implements exactly one step and is pure apart from the
//! existence check in [`images`].
//!
//! ## Data Flow
//!
//! ```text
//! markdown ──▶ postprocess ──▶ images ──▶ (upload) ──▶ replace
//! (parse)      (dialect)       (scan)                  (relink)
//! ```
//!
//! 1. [`markdown`]    — CommonMark → HTML fragment, entities decoded
//! 2. [`postprocess`] — ordered rewrite stages producing the site dialect
//! 3. [`images`]      — find local `<img>` files next to the HTML
//! 4. [`replace`]     — ordered literal substitutions, used to point local
//!    image paths at their uploaded URLs

pub mod images;
pub mod markdown;
pub mod postprocess;
pub mod replace;
