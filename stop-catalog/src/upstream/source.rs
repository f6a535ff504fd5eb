//! The upstream stop source abstraction.

use std::future::Future;

use crate::domain::{StopAttributes, StopId};

use super::error::UpstreamError;

/// Scheduling hint for upstream requests.
///
/// `High` marks latency-sensitive work (a caller is waiting on a stop that
/// is not yet in the catalog). `Normal` is for background traffic such as
/// bulk refreshes elsewhere in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestPriority {
    High,
    #[default]
    Normal,
}

/// Source of canonical stop data.
///
/// This abstraction allows the repository to be tested with mock data.
pub trait StopSource {
    /// Fetch the canonical attributes of one stop.
    ///
    /// Fails if the identifier is unknown upstream, the transport fails, or
    /// the response cannot be decoded.
    fn fetch_stop(
        &self,
        stop_id: &StopId,
        priority: RequestPriority,
    ) -> impl Future<Output = Result<StopAttributes, UpstreamError>> + Send;
}
