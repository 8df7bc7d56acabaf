use chrono::Utc;
use mongodb::{bson::doc, options::FindOptions};
use rocket::{response::status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::announcement::NewAnnouncementRequest,
        auth::{AuthToken, Management},
        common::as_bson,
        db::{
            announcement::{Announcement, ReadReceipt},
            notification::{Notification, NotificationType},
        },
        mongodb::{Coll, Id},
    },
};

use super::common::{find_all, find_by_id, notify};

const LIST_LIMIT: usize = 100;

pub fn routes() -> Vec<Route> {
    routes![create_announcement, list_announcements, mark_read, delete_announcement]
}

#[post("/announcements", data = "<request>", format = "json")]
async fn create_announcement(
    token: AuthToken<Management>,
    request: Json<NewAnnouncementRequest>,
    announcements: Coll<Announcement>,
    notifications: Coll<Notification>,
) -> Result<status::Created<Json<Announcement>>> {
    request.validate()?;
    let announcement = Announcement::new(&token, request.0);
    announcements.insert_one(&announcement, None).await?;

    let priority = format!("{:?}", announcement.priority);
    for recipient in announcement.target_audience.recipients() {
        notify(
            &notifications,
            Notification::new(
                recipient,
                NotificationType::Announcement,
                announcement.title.clone(),
                announcement.description.clone(),
            )
            .about_announcement(&announcement.id)
            .with_priority(priority.clone()),
        )
        .await;
    }

    let location = format!("/api/announcements/{}", announcement.id);
    Ok(status::Created::new(location).body(Json(announcement)))
}

/// Live announcements addressed to the caller, pinned ones first.
#[get("/announcements")]
async fn list_announcements(
    token: AuthToken,
    announcements: Coll<Announcement>,
) -> Result<Json<Vec<Announcement>>> {
    let now = Utc::now();
    let millis = now.timestamp_millis();
    let filter = doc! {
        "valid_from": { "$lte": millis },
        "$or": [
            { "expires_at": null },
            { "expires_at": { "$gte": millis } },
        ],
    };
    let options = FindOptions::builder()
        .sort(doc! { "is_pinned": -1, "created_at": -1 })
        .build();

    let live = find_all(&announcements, filter, options).await?;
    let visible = live
        .into_iter()
        .filter(|a| a.is_valid_at(now) && a.target_audience.includes(&token))
        .take(LIST_LIMIT)
        .collect();
    Ok(Json(visible))
}

#[post("/announcements/<id>/read")]
async fn mark_read(
    token: AuthToken,
    id: Id,
    announcements: Coll<Announcement>,
) -> Result<Json<Announcement>> {
    let announcement = find_by_id(&announcements, &id, "Announcement").await?;
    if !announcement.is_read_by(&token.id) {
        let receipt = ReadReceipt {
            user: token.id.clone(),
            read_at: Utc::now(),
        };
        // Guard on the receipt being absent so concurrent reads record once.
        announcements
            .update_one(
                doc! { "id": &id, "read_by.user": { "$ne": &token.id } },
                doc! { "$push": { "read_by": as_bson(&receipt) } },
                None,
            )
            .await?;
    }
    Ok(Json(find_by_id(&announcements, &id, "Announcement").await?))
}

#[delete("/announcements/<id>")]
async fn delete_announcement(
    _token: AuthToken<Management>,
    id: Id,
    announcements: Coll<Announcement>,
) -> Result<status::NoContent> {
    let result = announcements.delete_one(id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found("Announcement"));
    }
    Ok(status::NoContent)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::{
        api::common::testing::sign_up,
        model::{
            api::auth::{Bearer, RegisterRequest},
            common::Role,
            db::announcement::TargetAudience,
        },
    };

    use super::*;

    async fn publish(
        client: &Client,
        bearer: &Bearer,
        request: NewAnnouncementRequest,
    ) -> Announcement {
        let response = client
            .post(uri!("/api", create_announcement))
            .header(ContentType::JSON)
            .header(bearer.clone())
            .body(json!(request).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        response.into_json().await.unwrap()
    }

    async fn listed(client: &Client, bearer: &Bearer) -> Vec<Announcement> {
        let response = client
            .get(uri!("/api", list_announcements))
            .header(bearer.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test(management)]
    async fn audience_and_pinning(
        client: Client,
        bearer: Bearer,
        notifications: Coll<Notification>,
    ) {
        let general = publish(&client, &bearer, NewAnnouncementRequest::example()).await;
        let pinned = publish(
            &client,
            &bearer,
            NewAnnouncementRequest {
                title: "Fire drill".to_string(),
                is_pinned: true,
                ..NewAnnouncementRequest::example()
            },
        )
        .await;
        let hostel_b = publish(
            &client,
            &bearer,
            NewAnnouncementRequest {
                title: "Hostel B painting".to_string(),
                target_audience: TargetAudience {
                    hostels: vec!["B".to_string()],
                    ..Default::default()
                },
                ..NewAnnouncementRequest::example()
            },
        )
        .await;
        publish(
            &client,
            &bearer,
            NewAnnouncementRequest {
                title: "Already over".to_string(),
                expires_at: Some(Utc::now() - Duration::hours(1)),
                ..NewAnnouncementRequest::example()
            },
        )
        .await;

        let student = sign_up(&client, &RegisterRequest::example_student()).await;
        let seen: Vec<Id> = listed(&client, &student).await.into_iter().map(|a| a.id).collect();
        assert_eq!(seen, vec![pinned.id.clone(), general.id.clone()]);

        let other = sign_up(&client, &RegisterRequest::example_other_student()).await;
        let seen = listed(&client, &other).await;
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].id, pinned.id);
        assert!(seen.iter().any(|a| a.id == hostel_b.id));

        let filter = doc! { "recipient": "hostel:B", "related_announcement": &hostel_b.id };
        let alert = notifications.find_one(filter, None).await.unwrap().unwrap();
        assert_eq!(alert.kind, NotificationType::Announcement);
        assert_eq!(alert.priority, "Important");
    }

    #[backend_test(management)]
    async fn role_targeted(client: Client, bearer: Bearer) {
        publish(
            &client,
            &bearer,
            NewAnnouncementRequest {
                target_audience: TargetAudience {
                    roles: vec![Role::Management],
                    ..Default::default()
                },
                ..NewAnnouncementRequest::example()
            },
        )
        .await;
        assert_eq!(listed(&client, &bearer).await.len(), 1);

        let student = sign_up(&client, &RegisterRequest::example_student()).await;
        assert!(listed(&client, &student).await.is_empty());
    }

    #[backend_test(management)]
    async fn read_once_then_delete(client: Client, bearer: Bearer) {
        let announcement = publish(&client, &bearer, NewAnnouncementRequest::example()).await;
        let student = sign_up(&client, &RegisterRequest::example_student()).await;

        for _ in 0..2 {
            let response = client
                .post(uri!("/api", mark_read(&announcement.id)))
                .header(student.clone())
                .dispatch()
                .await;
            assert_eq!(Status::Ok, response.status());
            let read: Announcement = response.into_json().await.unwrap();
            assert_eq!(read.read_by.len(), 1);
        }

        let response = client
            .delete(uri!("/api", delete_announcement(&announcement.id)))
            .header(student)
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());

        let response = client
            .delete(uri!("/api", delete_announcement(&announcement.id)))
            .header(bearer.clone())
            .dispatch()
            .await;
        assert_eq!(Status::NoContent, response.status());

        let response = client
            .delete(uri!("/api", delete_announcement(&announcement.id)))
            .header(bearer)
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(student)]
    async fn students_cannot_publish(client: Client, bearer: Bearer) {
        let response = client
            .post(uri!("/api", create_announcement))
            .header(ContentType::JSON)
            .header(bearer)
            .body(json!(NewAnnouncementRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Forbidden, response.status());
    }
}
