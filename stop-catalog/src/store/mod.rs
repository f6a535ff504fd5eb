//! Persistent storage for stops and route patterns.
//!
//! The repository depends only on the [`StopStore`] trait. [`SqliteStore`]
//! is the durable implementation; [`MemoryStore`] keeps everything in
//! process.

mod error;
mod memory;
mod sqlite;
mod stop_store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreConfig};
pub use stop_store::StopStore;
