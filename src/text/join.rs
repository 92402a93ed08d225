//! Side-by-side composition of rendered text blocks

use itertools::Itertools;

use crate::utils::{display_width, pad_right};

/// Lay `blocks` out next to each other.
///
/// Every block gets a field as wide as its widest line plus the display
/// width of `separator`; blocks shorter than the tallest one are padded with
/// blank fields so the columns stay aligned.
pub fn join<S: AsRef<str>>(blocks: &[S], separator: &str) -> String {
    let split: Vec<Vec<&str>> = blocks.iter().map(|b| b.as_ref().lines().collect()).collect();
    let pad = display_width(separator);
    let widths: Vec<usize> = split
        .iter()
        .map(|lines| lines.iter().map(|l| display_width(l)).max().unwrap_or(0) + pad)
        .collect();
    let height = split.iter().map(Vec::len).max().unwrap_or(0);

    (0..height)
        .map(|i| {
            split
                .iter()
                .zip(&widths)
                .map(|(lines, &width)| pad_right(lines.get(i).copied().unwrap_or(""), width))
                .join("")
                + "\n"
        })
        .collect()
}
