//! Utility functions for formatting and common operations
//!
//! This module provides centralized formatting utilities for consistent
//! display of signed numbers, currency values and padded text cells across
//! the text renderers, chart labels and report bodies.

use rust_decimal::Decimal;
use unicode_width::UnicodeWidthStr;

/// Format a signed fixed-decimal number right-aligned to `width`, with an
/// optional `%` suffix appended after the padded number.
///
/// # Examples
/// ```
/// use market_report::utils::format_signed;
///
/// assert_eq!(format_signed(1.5, 1, 5, false), " +1.5");
/// assert_eq!(format_signed(-10.0, 0, 4, true), " -10%");
/// ```
pub fn format_signed(value: f64, decimals: usize, width: usize, percent: bool) -> String {
    let suffix = if percent { "%" } else { "" };
    format!(
        "{:>+width$.prec$}{}",
        value,
        suffix,
        width = width,
        prec = decimals
    )
}

/// Width of `|value|` printed with `decimals` places, plus one column for the sign.
pub fn signed_width(value: f64, decimals: usize) -> usize {
    format!("{:.prec$}", value.abs(), prec = decimals).len() + 1
}

/// Terminal display width of a string
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Left-justify `s` to `width` display columns
pub fn pad_right(s: &str, width: usize) -> String {
    let w = display_width(s);
    if w >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - w))
    }
}

/// Format a dollar amount with thousands separators: "$1,234.56"
///
/// # Examples
/// ```
/// use market_report::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(1234.56), 2), "$1,234.56");
/// assert_eq!(format_currency(dec!(-500), 0), "-$500");
/// ```
pub fn format_currency(value: Decimal, decimals: u32) -> String {
    let is_negative = value < Decimal::ZERO;
    let rounded = value.abs().round_dp(decimals);
    let formatted = format!("{:.prec$}", rounded, prec = decimals as usize);
    let (integer_part, decimal_part) = match formatted.split_once('.') {
        Some((i, d)) => (i, Some(d)),
        None => (formatted.as_str(), None),
    };

    // Add thousands separators (,) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    match decimal_part {
        Some(d) => format!("{}${}.{}", sign, with_separators, d),
        None => format!("{}${}", sign, with_separators),
    }
}

/// Lowercase ASCII slug for file names: "1 Day Change %" -> "1-day-change"
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}
