use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::marketplace::NewListingRequest, common::{bson_enum, MediaItem}, db::user::User,
    mongodb::Id,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
pub enum ListingCategory {
    Electronics,
    Books,
    Furniture,
    Clothing,
    Accessories,
    Stationery,
    Others,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
pub enum ListingStatus {
    Available,
    Sold,
    Reserved,
}

bson_enum!(ListingCategory, ListingStatus);

/// An item a resident is selling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Id,
    pub seller_id: Id,
    pub seller_name: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: ListingCategory,
    pub condition: String,
    pub status: ListingStatus,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn new(seller: &User, request: NewListingRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            seller_id: seller.id.clone(),
            seller_name: seller.name.clone(),
            title: request.title,
            description: request.description,
            price: request.price,
            category: request.category,
            condition: request.condition,
            status: ListingStatus::Available,
            media: Vec::new(),
            contact_phone: request.contact_phone,
            contact_email: request.contact_email.or_else(|| Some(seller.email.clone())),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_seller(&self, user: &User) -> bool {
        self.seller_id == user.id
    }

    /// Sellers and managers may change a listing's status or remove it.
    pub fn can_moderate(&self, user: &User) -> bool {
        self.is_seller(user) || user.role.is_management()
    }
}
