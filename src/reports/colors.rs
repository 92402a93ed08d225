//! Diverging red/white/green colors for return bars
//!
//! Gains are green and losses red; the larger a value is relative to the
//! largest magnitude in its batch, the more saturated its color.

use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

use super::returns::ReturnSeries;

/// Lightest tint, used for values close to zero
const MAX_INTENSITY: f64 = 0.75;
const ALPHA: f64 = 0.67;

/// Color used when a batch carries no magnitude to encode
pub const NEUTRAL: Rgba = Rgba {
    r: MAX_INTENSITY,
    g: MAX_INTENSITY,
    b: MAX_INTENSITY,
    a: ALPHA,
};

/// RGBA color with channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    /// CSS/SVG notation, e.g. `rgba(255,191,191,0.67)`
    pub fn to_css(&self) -> String {
        let channel = |c: f64| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgba({},{},{},{:.2})",
            channel(self.r),
            channel(self.g),
            channel(self.b),
            self.a
        )
    }
}

/// Color for `value` given the batch's largest absolute value.
pub fn color_for(value: f64, max_abs_value: f64) -> Rgba {
    if max_abs_value == 0.0 || !max_abs_value.is_finite() || value.is_nan() {
        return NEUTRAL;
    }
    let intensity = (MAX_INTENSITY * (1.0 - value.abs() / max_abs_value)).clamp(0.0, MAX_INTENSITY);
    if value < 0.0 {
        Rgba {
            r: 1.0,
            g: intensity,
            b: intensity,
            a: ALPHA,
        }
    } else {
        Rgba {
            r: intensity,
            g: 1.0,
            b: intensity,
            a: ALPHA,
        }
    }
}

/// One color per entry of `series`, scaled to the series' own max magnitude.
pub fn colors_for(series: &ReturnSeries) -> Vec<Rgba> {
    let max_abs = series.max_abs().to_f64().unwrap_or(0.0);
    series
        .values()
        .into_iter()
        .map(|v| color_for(v, max_abs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_max_is_neutral() {
        assert_eq!(color_for(0.0, 0.0), NEUTRAL);
        assert_eq!(color_for(1.0, 0.0), NEUTRAL);
    }

    #[test]
    fn test_extremes_are_fully_saturated() {
        assert_eq!(
            color_for(-2.0, 2.0),
            Rgba { r: 1.0, g: 0.0, b: 0.0, a: 0.67 }
        );
        assert_eq!(
            color_for(2.0, 2.0),
            Rgba { r: 0.0, g: 1.0, b: 0.0, a: 0.67 }
        );
    }

    #[test]
    fn test_zero_value_is_lightest_green() {
        let c = color_for(0.0, 5.0);
        assert_eq!(c, Rgba { r: 0.75, g: 1.0, b: 0.75, a: 0.67 });
    }

    #[test]
    fn test_intensity_is_clamped() {
        // A value beyond the stated max cannot go negative
        let c = color_for(-4.0, 2.0);
        assert_eq!(c.g, 0.0);
        let half = color_for(1.0, 2.0);
        assert!((half.r - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_colors_for_series() {
        let s = ReturnSeries::new(vec![
            ("A".to_string(), dec!(-0.02)),
            ("B".to_string(), dec!(0.01)),
        ]);
        let colors = colors_for(&s);
        assert_eq!(colors.len(), 2);
        assert_eq!(colors[0].r, 1.0);
        assert_eq!(colors[1].g, 1.0);
        assert!((colors[1].r - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_to_css() {
        assert_eq!(NEUTRAL.to_css(), "rgba(191,191,191,0.67)");
    }
}
