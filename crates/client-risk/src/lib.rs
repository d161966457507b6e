//! Client billing risk scoring.
//!
//! [`scoring`] holds the pure engine; [`ledger`] and [`report`] move invoices and assessments
//! in and out as CSV; [`config`], [`error`] and [`telemetry`] carry the service plumbing.

pub mod config;
pub mod error;
pub mod ledger;
pub mod report;
pub mod scoring;
pub mod telemetry;
