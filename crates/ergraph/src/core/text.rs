//! Shared text utilities for label fitting
//!
//! Port and header labels are clipped to the width of their region with a
//! trailing ellipsis. Widths are estimated from display columns, so wide
//! (CJK) characters count double.

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Approximate pixel width of one display column at label font size
pub const COLUMN_WIDTH_PX: f64 = 6.0;

const ELLIPSIS: char = '…';

/// Estimated pixel width of `text`
pub fn text_width_px(text: &str) -> f64 {
    UnicodeWidthStr::width(text) as f64 * COLUMN_WIDTH_PX
}

/// Clip `text` so that it fits within `max_width_px`, appending an ellipsis
/// when anything was cut.
///
/// Returns the text unchanged when it already fits. A region too narrow for
/// even the ellipsis yields an empty string.
///
/// # Example
/// ```
/// use ergraph::core::fit_label;
///
/// assert_eq!(fit_label("id", 60.0), "id");
/// assert_eq!(fit_label("created_at", 30.0), "crea…");
/// ```
pub fn fit_label(text: &str, max_width_px: f64) -> String {
    if text_width_px(text) <= max_width_px {
        return text.to_string();
    }

    let max_columns = (max_width_px / COLUMN_WIDTH_PX).floor() as usize;
    if max_columns == 0 {
        return String::new();
    }

    // one column is reserved for the ellipsis
    let budget = max_columns - 1;
    let mut used = 0;
    let mut out = String::new();
    for ch in text.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push(ELLIPSIS);
    out
}

/// Fit every line of a multi-line label independently
pub fn fit_lines(text: &str, max_width_px: f64) -> String {
    text.split('\n')
        .map(|line| fit_label(line, max_width_px))
        .collect::<Vec<_>>()
        .join("\n")
}
