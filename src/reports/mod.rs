// Reports module - return calculations and report assembly

pub mod colors;
pub mod portfolio;
pub mod returns;
pub mod universe;

pub use portfolio::PortfolioReport;
pub use returns::{cumulative_return, dollar_return, percent_return, ReturnSeries};
pub use universe::UniverseReport;

use chrono::NaiveDate;

/// Fill the single `%s` placeholder of a subject template with `date`.
pub fn format_subject(format: &str, date: NaiveDate) -> String {
    format.replacen("%s", &date.format("%Y-%m-%d").to_string(), 1)
}
