// Text module - fixed-width text blocks for plain-text report bodies

pub mod column;
pub mod histogram;
pub mod join;

pub use column::render_column;
pub use histogram::{bucket_counts, render_histogram, HistogramOptions};
pub use join::join;
