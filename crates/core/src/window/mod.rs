//! Date-range partitioning into fixed-width request windows.

mod walker;

pub use walker::*;
