use chrono::Utc;
use mongodb::bson::{doc, Document};
use rocket::{form::Form, response::status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    media::Media,
    model::{
        api::marketplace::{ListingEdit, NewListingRequest, StatusFilter, UploadResponse},
        auth::AuthToken,
        common::{as_bson, MediaItem},
        db::listing::{Listing, ListingCategory, ListingStatus},
        mongodb::{Coll, Id},
    },
};

use super::common::{contains_text, find_all, find_by_id, newest, Upload};

const LIST_LIMIT: i64 = 100;

pub fn routes() -> Vec<Route> {
    routes![
        create_listing,
        list_listings,
        get_listing,
        set_status,
        edit_listing,
        upload_image,
        delete_listing,
    ]
}

#[post("/marketplace", data = "<request>", format = "json")]
async fn create_listing(
    token: AuthToken,
    request: Json<NewListingRequest>,
    listings: Coll<Listing>,
) -> Result<status::Created<Json<Listing>>> {
    request.validate()?;
    let listing = Listing::new(&token, request.0);
    listings.insert_one(&listing, None).await?;
    let location = format!("/api/marketplace/{}", listing.id);
    Ok(status::Created::new(location).body(Json(listing)))
}

#[get("/marketplace?<category>&<status>&<search>")]
async fn list_listings(
    _token: AuthToken,
    category: Option<ListingCategory>,
    status: Option<StatusFilter>,
    search: Option<String>,
    listings: Coll<Listing>,
) -> Result<Json<Vec<Listing>>> {
    let mut filter = Document::new();
    if let Some(category) = category {
        filter.insert("category", category);
    }
    if let StatusFilter::Only(status) = status.unwrap_or_default() {
        filter.insert("status", status);
    }
    if let Some(search) = search.filter(|s| !s.trim().is_empty()) {
        let text = contains_text(&search);
        filter.insert(
            "$or",
            vec![
                doc! { "title": text.clone() },
                doc! { "description": text },
            ],
        );
    }
    Ok(Json(find_all(&listings, filter, newest(LIST_LIMIT)).await?))
}

#[get("/marketplace/<id>")]
async fn get_listing(_token: AuthToken, id: Id, listings: Coll<Listing>) -> Result<Json<Listing>> {
    Ok(Json(find_by_id(&listings, &id, "Listing").await?))
}

#[put("/marketplace/<id>/status?<status>")]
async fn set_status(
    token: AuthToken,
    id: Id,
    status: ListingStatus,
    listings: Coll<Listing>,
) -> Result<Json<Listing>> {
    let listing = find_by_id(&listings, &id, "Listing").await?;
    if !listing.can_moderate(&token) {
        return Err(Error::forbidden("Only the seller or management can change this listing"));
    }
    listings
        .update_one(
            id.as_doc(),
            doc! { "$set": { "status": status, "updated_at": Utc::now().timestamp_millis() } },
            None,
        )
        .await?;
    Ok(Json(find_by_id(&listings, &id, "Listing").await?))
}

#[put("/marketplace/<id>", data = "<edit>", format = "json")]
async fn edit_listing(
    token: AuthToken,
    id: Id,
    edit: Json<ListingEdit>,
    listings: Coll<Listing>,
) -> Result<Json<Listing>> {
    edit.validate()?;
    let listing = find_by_id(&listings, &id, "Listing").await?;
    if !listing.is_seller(&token) {
        return Err(Error::forbidden("Only the seller can edit this listing"));
    }
    listings
        .update_one(id.as_doc(), doc! { "$set": edit.set_fields(Utc::now()) }, None)
        .await?;
    Ok(Json(find_by_id(&listings, &id, "Listing").await?))
}

#[post("/marketplace/<id>/upload", data = "<upload>")]
async fn upload_image(
    token: AuthToken,
    id: Id,
    upload: Form<Upload<'_>>,
    media: &State<Media>,
    listings: Coll<Listing>,
) -> Result<Json<UploadResponse>> {
    let listing = find_by_id(&listings, &id, "Listing").await?;
    if !listing.is_seller(&token) {
        return Err(Error::forbidden("Only the seller can add images"));
    }
    let item: MediaItem = upload.send(media, "hostel/marketplace").await?.into();
    listings
        .update_one(
            id.as_doc(),
            doc! {
                "$push": { "media": as_bson(&item) },
                "$set": { "updated_at": Utc::now().timestamp_millis() },
            },
            None,
        )
        .await?;
    Ok(Json(UploadResponse {
        url: item.url,
        public_id: item.public_id,
    }))
}

#[delete("/marketplace/<id>")]
async fn delete_listing(
    token: AuthToken,
    id: Id,
    media: &State<Media>,
    listings: Coll<Listing>,
) -> Result<status::NoContent> {
    let listing = find_by_id(&listings, &id, "Listing").await?;
    if !listing.can_moderate(&token) {
        return Err(Error::forbidden("Only the seller or management can remove this listing"));
    }
    listings.delete_one(id.as_doc(), None).await?;
    media.delete_all(&listing.media).await;
    Ok(status::NoContent)
}
