//! Core domain types and logic.

pub mod bar;
pub mod config_validation;
pub mod error;
pub mod execution;
pub mod indicator;
pub mod ledger;
pub mod metrics;
pub mod policy;
pub mod position;
pub mod runner;
pub mod signal;
pub mod sweep;
pub mod vectorized;
