//! Analysis modules.
//!
//! Severity counting over module sheets.

pub mod aggregator;

pub use aggregator::*;
