//! Positional splicing of skeleton artifacts into a host HTML document.
//!
//! Two insertions happen, in this order:
//!
//! ```text
//! <head>...<style>{stylesheet}</style></head> ... {anchor}{markup}...
//!          ^ last `</head>`                             ^ end of last anchor
//! ```
//!
//! The style block goes in first, against the untouched document. The
//! anchor offset is then searched again in the already-mutated string, so
//! it stays correct even though the style block shifted everything after
//! the head.

mod insert;

use tracing::{debug, instrument};

use skeletonize_shared::{RenderResult, Result, SkeletonError};

pub use insert::insert_at;

/// Marker before which the inline style block is inserted.
pub const HEAD_CLOSE: &str = "</head>";

/// Wrap a stylesheet in an inline `<style>` element.
pub fn style_block(stylesheet: &str) -> String {
    format!("<style>{stylesheet}</style>")
}

/// Byte offset of the last `</head>` in `html`.
pub fn head_offset(html: &str) -> Option<usize> {
    html.rfind(HEAD_CLOSE)
}

/// Byte offset right after the last occurrence of `anchor` in `html`.
pub fn anchor_offset(html: &str, anchor: &str) -> Option<usize> {
    html.rfind(anchor).map(|pos| pos + anchor.len())
}

/// Splice a rendered skeleton into `html`.
///
/// Returns [`SkeletonError::AnchorNotFound`] when either the closing head tag
/// or `anchor` is missing; the caller's document is left as it was.
#[instrument(skip_all, fields(anchor = %anchor, html_len = html.len()))]
pub fn splice_skeleton(html: &str, anchor: &str, rendered: &RenderResult) -> Result<String> {
    let head = head_offset(html).ok_or_else(|| SkeletonError::anchor_not_found(HEAD_CLOSE))?;
    let with_style = insert_at(html, &style_block(&rendered.stylesheet), head);

    let after_anchor =
        anchor_offset(&with_style, anchor).ok_or_else(|| SkeletonError::anchor_not_found(anchor))?;
    let spliced = insert_at(&with_style, &rendered.markup, after_anchor);

    debug!(
        head_offset = head,
        anchor_offset = after_anchor,
        final_len = spliced.len(),
        "skeleton spliced"
    );

    Ok(spliced)
}
