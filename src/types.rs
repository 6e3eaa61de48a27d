//! Shared index newtypes and aliases used across the protocol.
//!
//! Centralizing these here (rather than duplicating `u32`/`String` in every
//! module) keeps the activity/case distinction visible at call sites.

use std::fmt;

/// Index of an activity node `a ∈ [0, N)`. Every Activity Node owns exactly
/// one id and only ever mutates its own row of the footprint matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActivityId(pub u32);

impl ActivityId {
    /// Access the underlying index.
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ActivityId {
    fn from(v: u32) -> Self {
        ActivityId(v)
    }
}

/// Opaque case identifier. Cases carry no structure beyond equality.
pub type CaseId = String;

/// A totally-ordered event instant. `chrono` gives us `Ord`/`PartialOrd` for
/// free, which is all the protocol needs (strict per-case ordering, §9).
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parse a timestamp the way every wire boundary in this crate does: strict
/// RFC 3339 (a compatible superset of the ISO-8601 profile §8 uses in its
/// scenarios).
pub fn parse_timestamp(s: &str) -> Result<Timestamp, chrono::ParseError> {
    chrono::DateTime::parse_from_rfc3339(s).map(|dt| dt.with_timezone(&chrono::Utc))
}
