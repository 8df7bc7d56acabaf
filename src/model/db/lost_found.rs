use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        api::lost_found::NewItemRequest,
        common::{bson_enum, MediaItem, Role},
        db::user::User,
        mongodb::Id,
    },
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Lost,
    Found,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
pub enum ItemCategory {
    Electronics,
    Documents,
    Clothing,
    Accessories,
    Books,
    Keys,
    Others,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Open,
    Matched,
    Claimed,
    Returned,
    Closed,
}

bson_enum!(ItemKind, ItemCategory, ItemStatus);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemLocation {
    pub hostel: Option<String>,
    pub block: Option<String>,
    pub specific_place: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default = "default_preferred_contact")]
    pub preferred_contact: String,
}

fn default_preferred_contact() -> String {
    "email".to_string()
}

impl Default for ContactInfo {
    fn default() -> Self {
        Self {
            phone: None,
            email: None,
            preferred_contact: default_preferred_contact(),
        }
    }
}

/// A lost or found item report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LostFoundItem {
    pub id: Id,
    pub reporter: Id,
    pub reporter_name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub item_name: String,
    pub description: String,
    pub category: ItemCategory,
    pub location: ItemLocation,
    #[serde(with = "ts_milliseconds")]
    pub date_reported: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub last_seen_date: Option<DateTime<Utc>>,
    pub status: ItemStatus,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    pub contact_info: ContactInfo,
    pub matched_with: Option<Id>,
    pub claimant: Option<Id>,
    pub claimant_name: Option<String>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub claim_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub verification_verified: bool,
    pub verification_verified_by: Option<Id>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub verification_verified_at: Option<DateTime<Utc>>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl LostFoundItem {
    pub fn new(reporter: &User, request: NewItemRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            reporter: reporter.id.clone(),
            reporter_name: reporter.name.clone(),
            kind: request.kind,
            item_name: request.item_name,
            description: request.description,
            category: request.category,
            location: request.location,
            date_reported: now,
            last_seen_date: request.last_seen_date,
            status: ItemStatus::Open,
            media: Vec::new(),
            contact_info: request.contact_info,
            matched_with: None,
            claimant: None,
            claimant_name: None,
            claim_timestamp: None,
            verification_verified: false,
            verification_verified_by: None,
            verification_verified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_reporter(&self, user: &User) -> bool {
        self.reporter == user.id
    }

    /// Update recording a claim by `claimant`. A student's claim awaits
    /// verification, while a manager's claim is final.
    pub fn claim_update(&self, claimant: &User, now: DateTime<Utc>) -> Result<Document> {
        if self.status == ItemStatus::Claimed {
            return Err(Error::bad_request("Item already claimed"));
        }
        let status = match claimant.role {
            Role::Student => ItemStatus::Matched,
            Role::Management => ItemStatus::Claimed,
        };
        Ok(doc! {
            "$set": {
                "claimant": &claimant.id,
                "claimant_name": claimant.name.clone(),
                "claim_timestamp": now.timestamp_millis(),
                "status": status,
                "updated_at": now.timestamp_millis(),
            }
        })
    }

    /// Update recording a manager's verdict on a claim.
    pub fn verification_update(verified: bool, verifier: &User, now: DateTime<Utc>) -> Document {
        let status = if verified {
            ItemStatus::Returned
        } else {
            ItemStatus::Open
        };
        doc! {
            "$set": {
                "verification_verified": verified,
                "verification_verified_by": &verifier.id,
                "verification_verified_at": now.timestamp_millis(),
                "status": status,
                "updated_at": now.timestamp_millis(),
            }
        }
    }
}
