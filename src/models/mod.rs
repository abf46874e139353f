//! Data models

pub mod prediction;
pub mod trend;
pub mod batch;

pub use prediction::*;
pub use trend::*;
pub use batch::*;
