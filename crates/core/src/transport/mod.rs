//! HTTP transport abstraction.
//!
//! This module provides an `HttpTransport` trait that both pipelines dispatch
//! their requests through, and a reqwest-backed implementation.

mod http;
mod types;

pub use http::ReqwestTransport;
pub use types::*;
