//! Aggregate and plot the CSV results of ns-3 throughput experiments.
//!
//! The pipeline is strictly linear: [`table`] loads and cleans a results
//! file, [`aggregate`] groups and reduces it, [`stats`] turns per-run totals
//! into means with Student-t confidence intervals, and
//! [`tasks::experiments::plot`] renders the charts.

pub mod aggregate;
pub mod env;
pub mod error;
pub mod stats;
pub mod table;
pub mod tasks;
