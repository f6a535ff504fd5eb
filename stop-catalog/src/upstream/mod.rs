//! Upstream transit-data client.
//!
//! Fetches canonical stop attributes from the Digitransit GraphQL routing
//! API. The repository only depends on the [`StopSource`] trait; the HTTP
//! client is one implementation of it.

mod client;
mod error;
mod source;
mod types;

pub use client::{DigitransitClient, DigitransitConfig};
pub use error::UpstreamError;
pub use source::{RequestPriority, StopSource};
