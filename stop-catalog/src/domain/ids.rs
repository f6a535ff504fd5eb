//! Stop and route pattern identifier types.

use std::fmt;

use serde::Serialize;

/// Error returned when parsing an invalid stop identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop ID: {reason}")]
pub struct InvalidStopId {
    reason: &'static str,
}

/// Error returned when parsing an invalid route pattern identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid route pattern ID: {reason}")]
pub struct InvalidRoutePatternId {
    reason: &'static str,
}

/// Shared validation: identifiers are opaque but must carry some content.
fn check_non_blank(s: &str) -> Result<(), &'static str> {
    if s.is_empty() {
        return Err("cannot be empty");
    }
    if s.trim().is_empty() {
        return Err("cannot be only whitespace");
    }
    Ok(())
}

/// An upstream-assigned stop identifier.
///
/// Stop IDs are opaque strings assigned by the upstream transit-data
/// service (e.g. `HSL:1040129`). They are never generated locally. The only
/// validation is that they are not blank.
///
/// # Examples
///
/// ```
/// use stop_catalog::domain::StopId;
///
/// let id = StopId::parse("HSL:1040129").unwrap();
/// assert_eq!(id.as_str(), "HSL:1040129");
///
/// // Blank strings are rejected
/// assert!(StopId::parse("").is_err());
/// assert!(StopId::parse("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct StopId(String);

impl StopId {
    /// Parse a stop ID from a string.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidStopId> {
        let s = s.into();
        check_non_blank(&s).map_err(|reason| InvalidStopId { reason })?;
        Ok(StopId(s))
    }

    /// Returns the stop ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the StopId and returns the inner String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopId({})", self.0)
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A route pattern identifier (a directional variant of a route).
///
/// Like [`StopId`], this is opaque and only checked for blankness.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RoutePatternId(String);

impl RoutePatternId {
    /// Parse a route pattern ID from a string.
    pub fn parse(s: impl Into<String>) -> Result<Self, InvalidRoutePatternId> {
        let s = s.into();
        check_non_blank(&s).map_err(|reason| InvalidRoutePatternId { reason })?;
        Ok(RoutePatternId(s))
    }

    /// Returns the route pattern ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RoutePatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoutePatternId({})", self.0)
    }
}

impl fmt::Display for RoutePatternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
