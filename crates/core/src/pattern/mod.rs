//! Channel-name pattern expansion.
//!
//! A channel template such as `Current[0-20]` or `Voltage[A-C]N` names a
//! family of channels. [`expand`] turns it into the concrete names, in
//! ascending order.

mod expand;
mod types;

pub use expand::{expand, find_range_token};
pub use types::*;
