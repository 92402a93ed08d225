//! Market Report - daily portfolio and market universe return reports
//!
//! This library turns a daily price matrix into percent, dollar and
//! cumulative returns, renders them as aligned text columns, histograms and
//! SVG charts, and hands the finished reports to a mailer.

pub mod cli;
pub mod config;
pub mod error;
pub mod mailer;
pub mod market;
pub mod plotting;
pub mod pricing;
pub mod reports;
pub mod text;
pub mod utils;
