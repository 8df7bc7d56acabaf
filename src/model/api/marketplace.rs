use mongodb::bson::{doc, Document};
use rocket::form::{self, FromFormField, ValueField};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        api::issue::check_length,
        common::as_bson,
        db::listing::{ListingCategory, ListingStatus},
    },
};

pub const MIN_DESCRIPTION_LENGTH: usize = 10;

fn check_listing_fields(
    title: Option<&str>,
    description: Option<&str>,
    price: Option<f64>,
) -> Result<()> {
    if let Some(title) = title {
        check_length("Title", title, 2, 100)?;
    }
    if let Some(description) = description {
        check_length("Description", description, MIN_DESCRIPTION_LENGTH, usize::MAX)?;
    }
    if let Some(price) = price {
        if !price.is_finite() || price < 0.0 {
            return Err(Error::invalid("Price must be a non-negative number"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewListingRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: ListingCategory,
    pub condition: String,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

impl NewListingRequest {
    pub fn validate(&self) -> Result<()> {
        check_listing_fields(Some(&self.title), Some(&self.description), Some(self.price))
    }
}

/// A seller's edit to their listing. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<ListingCategory>,
    pub condition: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
}

impl ListingEdit {
    pub fn validate(&self) -> Result<()> {
        check_listing_fields(
            self.title.as_deref(),
            self.description.as_deref(),
            self.price,
        )
    }

    /// The `$set` contents for this edit.
    pub fn set_fields(&self, now: chrono::DateTime<chrono::Utc>) -> Document {
        let mut set = doc! { "updated_at": now.timestamp_millis() };
        if let Some(title) = &self.title {
            set.insert("title", title.trim());
        }
        if let Some(description) = &self.description {
            set.insert("description", description.clone());
        }
        if let Some(price) = self.price {
            set.insert("price", price);
        }
        if let Some(category) = &self.category {
            set.insert("category", as_bson(category));
        }
        if let Some(condition) = &self.condition {
            set.insert("condition", condition.clone());
        }
        if let Some(phone) = &self.contact_phone {
            set.insert("contact_phone", phone.clone());
        }
        if let Some(email) = &self.contact_email {
            set.insert("contact_email", email.clone());
        }
        set
    }
}

/// The `status` filter on listing queries: a single status, or `all`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(ListingStatus),
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::Only(ListingStatus::Available)
    }
}

#[rocket::async_trait]
impl<'r> FromFormField<'r> for StatusFilter {
    fn from_value(field: ValueField<'r>) -> form::Result<'r, Self> {
        if field.value.eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            ListingStatus::from_value(field).map(Self::Only)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
    pub public_id: Option<String>,
}


#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn listing_validation() {
        assert!(NewListingRequest::example().validate().is_ok());
        let short = NewListingRequest {
            description: "Cheap".to_string(),
            ..NewListingRequest::example()
        };
        assert!(short.validate().is_err());
        let negative = NewListingRequest {
            price: -1.0,
            ..NewListingRequest::example()
        };
        assert!(negative.validate().is_err());
        let tiny_title = NewListingRequest {
            title: "X".to_string(),
            ..NewListingRequest::example()
        };
        assert!(tiny_title.validate().is_err());
    }

    #[test]
    fn edit_sets_only_given_fields() {
        let edit = ListingEdit {
            price: Some(300.0),
            ..Default::default()
        };
        assert!(edit.validate().is_ok());
        let set = edit.set_fields(Utc::now());
        assert_eq!(set.get_f64("price"), Ok(300.0));
        assert!(!set.contains_key("title"));
    }
}
