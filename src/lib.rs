//! Whole-genome coverage statistics from `bedtools genomecov -bga` output.
//!
//! The [`core`] module turns a stream of interval records into depth, gap
//! and breadth statistics; [`report`] renders them as CSV.

pub mod core;
pub mod report;
