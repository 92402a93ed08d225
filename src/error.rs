//! Error handling for market reports
//!
//! Defines the typed errors raised by the return calculator, the text
//! renderers and the configuration loader, and establishes a unified Result
//! type using anyhow for context chaining in the application layer.

use thiserror::Error;

/// Core error types for report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("invalid offset {offset}: must be in [1, {date_count})")]
    InvalidOffset { offset: usize, date_count: usize },

    #[error("division by zero: base price of {symbol} is zero")]
    DivisionByZero { symbol: String },

    #[error("missing holding: {symbol} is not in the selected holdings snapshot")]
    MissingHolding { symbol: String },

    #[error("invalid bins: {0}")]
    InvalidBins(String),

    #[error("empty series: {0}")]
    EmptySeries(String),

    #[error("invalid price matrix: {0}")]
    InvalidPriceMatrix(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for application-level operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = ReportError::InvalidOffset {
            offset: 3,
            date_count: 3,
        };
        assert_eq!(err.to_string(), "invalid offset 3: must be in [1, 3)");

        let err = ReportError::DivisionByZero {
            symbol: "AAPL".to_string(),
        };
        assert_eq!(err.to_string(), "division by zero: base price of AAPL is zero");
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> = Err(ReportError::MissingHolding {
            symbol: "MSFT".to_string(),
        })
        .context("failed to build portfolio report");
        match result {
            Err(e) => {
                assert!(e.to_string().contains("failed to build portfolio report"));
                let root = e.root_cause().to_string();
                assert!(root.contains("MSFT"));
                assert!(e.downcast_ref::<ReportError>().is_some());
            }
            Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn test_io_error_shows_cause() {
        let err = ReportError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "outbox missing",
        ));
        assert_eq!(err.to_string(), "io error: outbox missing");
    }

    #[test]
    fn test_report_error_variants() {
        assert!(ReportError::InvalidBins("x".into())
            .to_string()
            .starts_with("invalid bins"));
        assert!(ReportError::EmptySeries("x".into())
            .to_string()
            .starts_with("empty series"));
        assert!(ReportError::Config("x".into())
            .to_string()
            .starts_with("config error"));
    }
}
