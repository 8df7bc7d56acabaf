use chrono::Utc;
use mongodb::bson::{doc, Document};
use rocket::{
    serde::json::{json, Json, Value},
    Route,
};

use crate::{
    error::{Error, Result},
    model::{
        api::notification::NotificationView,
        auth::AuthToken,
        db::{notification::Notification, user::User},
        mongodb::{Coll, Id},
    },
};

use super::common::{find_all, newest};

const INBOX_LIMIT: i64 = 50;

pub fn routes() -> Vec<Route> {
    routes![list_notifications, mark_read, mark_all_read]
}

/// Matches notifications addressed to the user directly or to a group they belong to.
fn inbox_filter(user: &User) -> Document {
    doc! { "recipient": { "$in": user.recipient_labels() } }
}

/// Matches inbox entries the user has not read yet.
fn unread_filter(user: &User) -> Document {
    let mut filter = inbox_filter(user);
    filter.extend(Notification::unread_by(&user.id));
    filter
}

#[get("/notifications?<unread_only>")]
async fn list_notifications(
    token: AuthToken,
    unread_only: Option<bool>,
    notifications: Coll<Notification>,
) -> Result<Json<Vec<NotificationView>>> {
    let filter = if unread_only.unwrap_or(false) {
        unread_filter(&token)
    } else {
        inbox_filter(&token)
    };
    let inbox = find_all(&notifications, filter, newest(INBOX_LIMIT)).await?;
    Ok(Json(
        inbox
            .into_iter()
            .map(|n| NotificationView::for_user(n, &token.id))
            .collect(),
    ))
}

#[patch("/notifications/<id>/read")]
async fn mark_read(
    token: AuthToken,
    id: Id,
    notifications: Coll<Notification>,
) -> Result<Json<Value>> {
    let mut filter = unread_filter(&token);
    filter.insert("id", &id);
    let update = Notification::read_update(&token.id, Utc::now());
    let result = notifications.update_one(filter, update, None).await?;
    if result.modified_count == 0 {
        return Err(Error::not_found("Notification"));
    }
    Ok(Json(json!({ "success": true })))
}

#[post("/notifications/read-all")]
async fn mark_all_read(token: AuthToken, notifications: Coll<Notification>) -> Result<Json<Value>> {
    let update = Notification::read_update(&token.id, Utc::now());
    let result = notifications
        .update_many(unread_filter(&token), update, None)
        .await?;
    Ok(Json(json!({ "updated": result.modified_count })))
}
