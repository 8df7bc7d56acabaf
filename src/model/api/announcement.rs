use chrono::{serde::ts_milliseconds_option, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::{
        api::issue::{check_length, MAX_TITLE_LENGTH},
        db::announcement::{AnnouncementCategory, AnnouncementPriority, TargetAudience},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAnnouncementRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: AnnouncementPriority,
    #[serde(default)]
    pub category: AnnouncementCategory,
    #[serde(default)]
    pub target_audience: TargetAudience,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, with = "ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewAnnouncementRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("Title", &self.title, 1, MAX_TITLE_LENGTH)?;
        check_length("Description", &self.description, 1, usize::MAX)
    }
}
