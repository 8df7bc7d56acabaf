use serde::{Deserialize, Serialize};

/// Placeholder used when a user has not filled in part of their location.
pub const UNKNOWN: &str = "N/A";

/// Where a user lives, snapshotted onto records they create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub hostel: String,
    pub block: String,
    pub room: String,
}

impl Location {
    /// Build a location from optional parts, substituting [`UNKNOWN`] for gaps.
    pub fn from_parts(hostel: Option<&str>, block: Option<&str>, room: Option<&str>) -> Self {
        let part = |p: Option<&str>| p.unwrap_or(UNKNOWN).to_string();
        Self {
            hostel: part(hostel),
            block: part(block),
            room: part(room),
        }
    }
}
