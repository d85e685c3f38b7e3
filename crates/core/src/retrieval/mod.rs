//! Bulk sensor-data retrieval.
//!
//! Crosses every feed's channel templates with the configured date range and
//! dispatches one GET per (feed, channel, window), each saved to its own CSV
//! file by the transport.

mod driver;
mod types;

pub use driver::RetrievalDriver;
pub use types::*;
