use chrono::{serde::ts_milliseconds_option, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::{
        api::issue::check_length,
        db::lost_found::{ContactInfo, ItemCategory, ItemKind, ItemLocation},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewItemRequest {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub item_name: String,
    pub description: String,
    pub category: ItemCategory,
    #[serde(default)]
    pub location: ItemLocation,
    #[serde(default, with = "ts_milliseconds_option")]
    pub last_seen_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub contact_info: ContactInfo,
}

impl NewItemRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("Item name", &self.item_name, 2, 100)?;
        check_length("Description", &self.description, 10, usize::MAX)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub verified: bool,
}
