//! Fixed-width text histograms
//!
//! Each bin becomes one line: `low  high  count  bar`, where the bar length
//! is proportional to the bin's share of all input values.

use crate::error::ReportError;
use crate::utils::{format_signed, signed_width};

/// Glyph used for histogram bars
pub const BLOCK: char = '█';

/// Rendering options for [`render_histogram`]
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramOptions {
    pub bins: Vec<f64>,
    pub bins_decimals: usize,
    pub bins_is_percent: bool,
    pub block_count: usize,
}

impl HistogramOptions {
    pub fn new(bins: Vec<f64>) -> Self {
        Self {
            bins,
            bins_decimals: 0,
            bins_is_percent: false,
            block_count: 100,
        }
    }
}

/// Bins must hold at least two finite, strictly ascending edges.
pub fn validate_bins(bins: &[f64]) -> Result<(), ReportError> {
    if bins.len() < 2 {
        return Err(ReportError::InvalidBins(format!(
            "need at least 2 edges, got {}",
            bins.len()
        )));
    }
    if let Some(edge) = bins.iter().find(|e| !e.is_finite()) {
        return Err(ReportError::InvalidBins(format!("edge {} is not finite", edge)));
    }
    if let Some(w) = bins.windows(2).find(|w| w[0] >= w[1]) {
        return Err(ReportError::InvalidBins(format!(
            "edges must be strictly ascending ({} followed by {})",
            w[0], w[1]
        )));
    }
    Ok(())
}

/// Count values per bin. Intervals are `[bins[i], bins[i+1])` except the last,
/// which also includes its upper edge. Values outside the range are dropped.
pub fn bucket_counts(series: &[f64], bins: &[f64]) -> Result<Vec<usize>, ReportError> {
    validate_bins(bins)?;
    let last = bins.len() - 2;
    let mut counts = vec![0usize; bins.len() - 1];

    for &value in series {
        if value.is_nan() || value < bins[0] || value > bins[last + 1] {
            continue;
        }
        // Index of the first edge strictly greater than value, minus one
        let idx = bins.partition_point(|&edge| edge <= value) - 1;
        counts[idx.min(last)] += 1;
    }
    Ok(counts)
}

/// Render `series` as a text histogram over the configured bins.
pub fn render_histogram(series: &[f64], options: &HistogramOptions) -> Result<String, ReportError> {
    let counts = bucket_counts(series, &options.bins)?;
    let total = series.len();

    let decimals = options.bins_decimals;
    let edge_width = options
        .bins
        .iter()
        .map(|&e| signed_width(e, decimals))
        .max()
        .unwrap_or(0);
    let count_width = counts
        .iter()
        .map(|c| c.to_string().len())
        .max()
        .unwrap_or(1);

    let mut histogram = String::new();
    for (i, &count) in counts.iter().enumerate() {
        // Exact number of blocks per line may vary due to rounding
        let blocks = if total == 0 {
            0
        } else {
            (options.block_count as f64 * count as f64 / total as f64).round_ties_even() as usize
        };
        histogram.push_str(&format!(
            "{}  {}  {:>cw$}  {}\n",
            format_signed(options.bins[i], decimals, edge_width, options.bins_is_percent),
            format_signed(options.bins[i + 1], decimals, edge_width, options.bins_is_percent),
            count,
            BLOCK.to_string().repeat(blocks),
            cw = count_width
        ));
    }
    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_counts_half_open_with_closed_last_bin() {
        let bins = [0.0, 1.0, 2.0, 3.0];
        let series = [0.0, 0.5, 1.0, 2.999, 3.0, 3.5, -0.1];
        let counts = bucket_counts(&series, &bins).unwrap();
        assert_eq!(counts, vec![2, 1, 2]);
    }

    #[test]
    fn test_bucket_total_equals_in_range_values() {
        let bins = [-5.0, -1.0, 0.0, 0.5, 7.0];
        let series: Vec<f64> = (-80..80).map(|i| i as f64 / 10.0).collect();
        let counts = bucket_counts(&series, &bins).unwrap();
        let in_range = series.iter().filter(|&&v| (-5.0..=7.0).contains(&v)).count();
        assert_eq!(counts.iter().sum::<usize>(), in_range);
    }

    #[test]
    fn test_invalid_bins() {
        assert!(matches!(
            render_histogram(&[1.0], &HistogramOptions::new(vec![1.0])),
            Err(ReportError::InvalidBins(_))
        ));
        assert!(matches!(
            render_histogram(&[1.0], &HistogramOptions::new(vec![0.0, 2.0, 1.0])),
            Err(ReportError::InvalidBins(_))
        ));
        assert!(validate_bins(&[0.0, 0.0]).is_err());
        assert!(validate_bins(&[0.0, f64::INFINITY]).is_err());
    }

    #[test]
    fn test_render_layout() {
        let options = HistogramOptions {
            bins: vec![-10.0, 0.0, 10.0],
            bins_decimals: 0,
            bins_is_percent: true,
            block_count: 10,
        };
        let series = [-5.0, 1.0, 2.0, 3.0, 50.0];
        let text = render_histogram(&series, &options).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        // 1 of 5 values -> 2 blocks, 3 of 5 -> 6 blocks
        assert_eq!(lines[0], "-10%   +0%  1  ██");
        assert_eq!(lines[1], " +0%  +10%  3  ██████");
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_render_with_decimals_and_wide_counts() {
        let options = HistogramOptions {
            bins: vec![0.0, 0.5, 1.0],
            bins_decimals: 1,
            bins_is_percent: false,
            block_count: 4,
        };
        let mut series = vec![0.1; 12];
        series.push(0.75);
        let text = render_histogram(&series, &options).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "+0.0  +0.5  12  ████");
        assert_eq!(lines[1], "+0.5  +1.0   1  ");
    }

    #[test]
    fn test_empty_series_renders_empty_bars() {
        let text = render_histogram(&[], &HistogramOptions::new(vec![0.0, 1.0])).unwrap();
        assert_eq!(text, "+0  +1  0  \n");
    }

    #[test]
    fn test_render_is_deterministic() {
        let options = HistogramOptions::new(vec![-2.0, -1.0, 0.0, 1.0, 2.0]);
        let series = [-1.5, -0.2, 0.3, 0.4, 1.9, 1.1];
        let a = render_histogram(&series, &options).unwrap();
        let b = render_histogram(&series, &options).unwrap();
        assert_eq!(a, b);
    }
}
