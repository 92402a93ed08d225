//! Two-column label/value tables

use crate::error::ReportError;
use crate::utils::{display_width, format_signed, pad_right, signed_width};

/// Render `label  value` lines, labels left-justified and values
/// right-justified with an explicit sign. Entries keep their input order.
pub fn render_column<S: AsRef<str>>(
    series: &[(S, f64)],
    decimals: usize,
    is_percent: bool,
) -> Result<String, ReportError> {
    if series.is_empty() {
        return Err(ReportError::EmptySeries(
            "cannot render a column without entries".to_string(),
        ));
    }

    let label_width = series
        .iter()
        .map(|(label, _)| display_width(label.as_ref()))
        .max()
        .unwrap_or(0);
    let value_width = series
        .iter()
        .map(|&(_, value)| signed_width(value, decimals))
        .max()
        .unwrap_or(0);

    let mut column = String::new();
    for (label, value) in series {
        column.push_str(&pad_right(label.as_ref(), label_width));
        column.push_str("  ");
        column.push_str(&format_signed(*value, decimals, value_width, is_percent));
        column.push('\n');
    }
    Ok(column)
}
