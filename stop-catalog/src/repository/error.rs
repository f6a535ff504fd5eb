//! Repository error taxonomy.
//!
//! Callers see two domain kinds: [`RepositoryError::NoSuchStop`] from
//! lookups, and [`RepositoryError::CouldNotSaveStop`] from every write
//! path. The write-path kind wraps a [`SaveStopError`] whose cause enums
//! keep the underlying failure available for diagnostics.
//!
//! A [`SaveStopError`] message names its subject and embeds the underlying
//! failure's message. The cause enums only label the failed step and leave
//! the underlying failure to `source()`.

use std::error::Error;

use crate::store::StoreError;
use crate::upstream::UpstreamError;

/// Errors from the stop repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No stop with this ID is in the store.
    #[error("no stop found with ID '{stop_id}'")]
    NoSuchStop { stop_id: String },

    /// A write path failed. Terminal for the call.
    #[error(transparent)]
    CouldNotSaveStop(#[from] SaveStopError),

    /// A read failed at the store level.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RepositoryError {
    /// Whether this is a `NoSuchStop` error.
    pub fn is_no_such_stop(&self) -> bool {
        matches!(self, RepositoryError::NoSuchStop { .. })
    }

    /// Whether this is a `CouldNotSaveStop` error.
    pub fn is_could_not_save(&self) -> bool {
        matches!(self, RepositoryError::CouldNotSaveStop(_))
    }
}

/// A failed write, by operation.
#[derive(Debug, thiserror::Error)]
pub enum SaveStopError {
    /// `create_by_id` failed.
    #[error("could not save stop with ID '{stop_id}': {}", with_detail(.cause))]
    Create {
        stop_id: String,
        #[source]
        cause: CreateStopFailure,
    },

    /// `associate_to_route_pattern` failed.
    #[error("{}", describe_associate(.stop_id, .route_pattern_id, .cause))]
    Associate {
        stop_id: String,
        route_pattern_id: String,
        #[source]
        cause: AssociateFailure,
    },
}

/// Why `create_by_id` failed.
#[derive(Debug, thiserror::Error)]
pub enum CreateStopFailure {
    #[error("upstream fetch failed")]
    UpstreamFetch(#[source] UpstreamError),

    #[error("store write failed")]
    StoreWrite(#[source] StoreError),
}

/// Why `associate_to_route_pattern` failed.
#[derive(Debug, thiserror::Error)]
pub enum AssociateFailure {
    #[error("stop not found")]
    StopNotFound,

    #[error("route pattern not found")]
    RoutePatternNotFound,

    #[error("store write failed")]
    StoreWrite(#[source] StoreError),
}

fn describe_associate(stop_id: &str, route_pattern_id: &str, cause: &AssociateFailure) -> String {
    match cause {
        AssociateFailure::StopNotFound => format!(
            "no stop found with ID '{stop_id}' to associate to route pattern with ID '{route_pattern_id}'"
        ),
        AssociateFailure::RoutePatternNotFound => format!(
            "no route pattern found with ID '{route_pattern_id}' to associate to stop with ID '{stop_id}'"
        ),
        AssociateFailure::StoreWrite(_) => format!(
            "could not associate stop with ID '{stop_id}' to route pattern with ID '{route_pattern_id}': {}",
            with_detail(cause)
        ),
    }
}

/// A cause label followed by the message of the failure behind it.
fn with_detail(cause: &dyn Error) -> String {
    match cause.source() {
        Some(detail) => format!("{cause}: {detail}"),
        None => cause.to_string(),
    }
}
