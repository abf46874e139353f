//! Core logic
//!
//! - `features` - 29-value input validation
//! - `classifier` - model port and loaded engine
//! - `scoring` - validate, classify, persist
//! - `trend` - counts and daily buckets with derived rates
//! - `batch` - row-by-row scoring with failure isolation

pub mod batch;
pub mod classifier;
pub mod features;
pub mod scoring;
pub mod trend;
