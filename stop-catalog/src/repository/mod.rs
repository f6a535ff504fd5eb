//! The stop repository.
//!
//! This is the only component that talks to both the upstream source and
//! the store. See [`StopRepository`] for the operations and their failure
//! semantics.

mod error;
mod stops;


pub use error::{AssociateFailure, CreateStopFailure, RepositoryError, SaveStopError};
pub use stops::StopRepository;
