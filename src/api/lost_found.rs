use chrono::Utc;
use mongodb::bson::{doc, Document};
use rocket::{form::Form, response::status, serde::json::Json, Route, State};

use crate::{
    error::{Error, Result},
    media::Media,
    model::{
        api::lost_found::{NewItemRequest, VerifyRequest},
        auth::{AuthToken, Management},
        common::{as_bson, MediaItem},
        db::lost_found::{ItemCategory, ItemKind, ItemStatus, LostFoundItem},
        mongodb::{Coll, Id},
    },
};

use super::common::{find_all, find_by_id, newest, Upload};

const LIST_LIMIT: i64 = 100;

pub fn routes() -> Vec<Route> {
    routes![report_item, list_items, claim_item, verify_claim, upload_photo, close_item]
}

/// Listing filters. `type` is not a valid Rust identifier, hence the rename.
#[derive(Debug, FromForm)]
struct ItemQuery {
    #[field(name = "type")]
    kind: Option<ItemKind>,
    category: Option<ItemCategory>,
}

#[post("/lost-found", data = "<request>", format = "json")]
async fn report_item(
    token: AuthToken,
    request: Json<NewItemRequest>,
    items: Coll<LostFoundItem>,
) -> Result<status::Created<Json<LostFoundItem>>> {
    request.validate()?;
    let item = LostFoundItem::new(&token, request.0);
    items.insert_one(&item, None).await?;
    let location = format!("/api/lost-found/{}", item.id);
    Ok(status::Created::new(location).body(Json(item)))
}

#[get("/lost-found?<query..>")]
async fn list_items(
    _token: AuthToken,
    query: ItemQuery,
    items: Coll<LostFoundItem>,
) -> Result<Json<Vec<LostFoundItem>>> {
    let mut filter = Document::new();
    if let Some(kind) = query.kind {
        filter.insert("type", kind);
    }
    if let Some(category) = query.category {
        filter.insert("category", category);
    }
    Ok(Json(find_all(&items, filter, newest(LIST_LIMIT)).await?))
}

#[post("/lost-found/<id>/claim")]
async fn claim_item(
    token: AuthToken,
    id: Id,
    items: Coll<LostFoundItem>,
) -> Result<Json<LostFoundItem>> {
    let item = find_by_id(&items, &id, "Item").await?;
    let update = item.claim_update(&token, Utc::now())?;
    items.update_one(id.as_doc(), update, None).await?;
    Ok(Json(find_by_id(&items, &id, "Item").await?))
}

#[patch("/lost-found/<id>/verify", data = "<request>", format = "json")]
async fn verify_claim(
    token: AuthToken<Management>,
    id: Id,
    request: Json<VerifyRequest>,
    items: Coll<LostFoundItem>,
) -> Result<Json<LostFoundItem>> {
    let update = LostFoundItem::verification_update(request.verified, &token, Utc::now());
    let result = items.update_one(id.as_doc(), update, None).await?;
    if result.matched_count == 0 {
        return Err(Error::not_found("Item"));
    }
    Ok(Json(find_by_id(&items, &id, "Item").await?))
}

#[post("/lost-found/<id>/upload", data = "<upload>")]
async fn upload_photo(
    token: AuthToken,
    id: Id,
    upload: Form<Upload<'_>>,
    media: &State<Media>,
    items: Coll<LostFoundItem>,
) -> Result<Json<MediaItem>> {
    let item = find_by_id(&items, &id, "Item").await?;
    if !item.is_reporter(&token) {
        return Err(Error::forbidden("Only the reporter can add photos"));
    }
    let photo: MediaItem = upload.send(media, "hostel/lost-found").await?.into();
    items
        .update_one(
            id.as_doc(),
            doc! {
                "$push": { "media": as_bson(&photo) },
                "$set": { "updated_at": Utc::now().timestamp_millis() },
            },
            None,
        )
        .await?;
    Ok(Json(photo))
}

#[patch("/lost-found/<id>/close")]
async fn close_item(
    token: AuthToken,
    id: Id,
    items: Coll<LostFoundItem>,
) -> Result<Json<LostFoundItem>> {
    let item = find_by_id(&items, &id, "Item").await?;
    if !item.is_reporter(&token) && !token.role.is_management() {
        return Err(Error::forbidden("Only the reporter or management can close this report"));
    }
    items
        .update_one(
            id.as_doc(),
            doc! {
                "$set": {
                    "status": ItemStatus::Closed,
                    "updated_at": Utc::now().timestamp_millis(),
                },
            },
            None,
        )
        .await?;
    Ok(Json(find_by_id(&items, &id, "Item").await?))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::{
        api::common::testing::sign_up,
        model::api::auth::{Bearer, RegisterRequest},
    };

    use super::*;

    async fn report(client: &Client, bearer: &Bearer, request: NewItemRequest) -> LostFoundItem {
        let response = client
            .post(uri!("/api", report_item))
            .header(ContentType::JSON)
            .header(bearer.clone())
            .body(json!(request).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test(student)]
    async fn filter_by_type(client: Client, bearer: Bearer) {
        report(&client, &bearer, NewItemRequest::example()).await;
        let found = report(
            &client,
            &bearer,
            NewItemRequest {
                kind: ItemKind::Found,
                item_name: "Room key".to_string(),
                category: ItemCategory::Keys,
                ..NewItemRequest::example()
            },
        )
        .await;
        assert_eq!(found.status, ItemStatus::Open);

        let response = client
            .get("/api/lost-found?type=found")
            .header(bearer.clone())
            .dispatch()
            .await;
        let listed: Vec<LostFoundItem> = response.into_json().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, found.id);

        let response = client
            .get("/api/lost-found?category=Accessories&type=lost")
            .header(bearer.clone())
            .dispatch()
            .await;
        let listed: Vec<LostFoundItem> = response.into_json().await.unwrap();
        assert_eq!(listed.len(), 1);

        let response = client.get("/api/lost-found").header(bearer).dispatch().await;
        let listed: Vec<LostFoundItem> = response.into_json().await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[backend_test(student)]
    async fn claim_and_verify(client: Client, bearer: Bearer) {
        let item = report(&client, &bearer, NewItemRequest::example()).await;
        let other = sign_up(&client, &RegisterRequest::example_other_student()).await;

        let response = client
            .post(uri!("/api", claim_item(&item.id)))
            .header(other)
            .dispatch()
            .await;
        let claimed: LostFoundItem = response.into_json().await.unwrap();
        assert_eq!(claimed.status, ItemStatus::Matched);
        assert_eq!(claimed.claimant_name.as_deref(), Some("Vikram Das"));

        let manager = sign_up(&client, &RegisterRequest::example_manager()).await;
        let response = client
            .patch(uri!("/api", verify_claim(&item.id)))
            .header(ContentType::JSON)
            .header(bearer.clone())
            .body(json!({ "verified": true }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        let response = client
            .patch(uri!("/api", verify_claim(&item.id)))
            .header(ContentType::JSON)
            .header(manager.clone())
            .body(json!({ "verified": false }).to_string())
            .dispatch()
            .await;
        let rejected: LostFoundItem = response.into_json().await.unwrap();
        assert_eq!(rejected.status, ItemStatus::Open);

        let response = client
            .post(uri!("/api", claim_item(&item.id)))
            .header(manager.clone())
            .dispatch()
            .await;
        let final_claim: LostFoundItem = response.into_json().await.unwrap();
        assert_eq!(final_claim.status, ItemStatus::Claimed);

        let response = client
            .post(uri!("/api", claim_item(&item.id)))
            .header(bearer)
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(student)]
    async fn closing_rights(client: Client, bearer: Bearer) {
        let item = report(&client, &bearer, NewItemRequest::example()).await;
        let other = sign_up(&client, &RegisterRequest::example_other_student()).await;

        let response = client
            .patch(uri!("/api", close_item(&item.id)))
            .header(other)
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        let response = client
            .patch(uri!("/api", close_item(&item.id)))
            .header(bearer)
            .dispatch()
            .await;
        let closed: LostFoundItem = response.into_json().await.unwrap();
        assert_eq!(closed.status, ItemStatus::Closed);
    }
}
