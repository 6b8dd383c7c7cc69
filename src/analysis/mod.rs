//! Analysis modules.
//!
//! Grouping, ordering and summary statistics over normalized records.

pub mod aggregator;

pub use aggregator::*;
