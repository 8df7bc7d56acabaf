use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file held by the external media host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub url: String,
    /// Opaque handle used to delete the file from the host later.
    pub public_id: Option<String>,
    pub file_type: String,
    #[serde(with = "ts_milliseconds")]
    pub uploaded_at: DateTime<Utc>,
}
