use chrono::Utc;
use mongodb::{
    bson::{doc, Document},
    options::{FindOptions, UpdateOptions},
};
use rocket::{response::status, serde::json::Json, Route};

use crate::{
    error::{Error, Result},
    model::{
        api::mess::{MenuRequest, MenuVoteRequest, NewPollRequest, PollVoteRequest},
        auth::{AuthToken, Management},
        db::{
            mess_menu::{DayOfWeek, MessMenu},
            poll::Poll,
        },
        mongodb::{Coll, Id},
    },
};

use super::common::{find_all, find_by_id, newest};

const POLL_LIMIT: i64 = 50;

pub fn routes() -> Vec<Route> {
    routes![
        upsert_menu,
        list_menu,
        vote_menu,
        delete_menu,
        create_poll,
        list_polls,
        vote_poll,
        close_poll,
    ]
}

/// Create or replace the menu for a (day, meal) slot. Existing votes are kept.
#[post("/mess/menu", data = "<request>", format = "json")]
async fn upsert_menu(
    _token: AuthToken<Management>,
    request: Json<MenuRequest>,
    menus: Coll<MessMenu>,
) -> Result<Json<MessMenu>> {
    request.validate()?;
    let slot = doc! { "day": request.day, "meal_type": request.meal_type };
    let fresh = MessMenu::new(request.0);

    let update = doc! {
        "$set": {
            "items": fresh.items.clone(),
            "special_items": fresh.special_items.clone(),
            "updated_at": fresh.updated_at.timestamp_millis(),
        },
        "$setOnInsert": {
            "id": &fresh.id,
            "votes_up": 0,
            "votes_down": 0,
            "voters": {},
            "created_at": fresh.created_at.timestamp_millis(),
        },
    };
    let options = UpdateOptions::builder().upsert(true).build();
    menus.update_one(slot.clone(), update, options).await?;

    menus
        .find_one(slot, None)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Menu"))
}

#[get("/mess/menu?<day>")]
async fn list_menu(
    _token: AuthToken,
    day: Option<DayOfWeek>,
    menus: Coll<MessMenu>,
) -> Result<Json<Vec<MessMenu>>> {
    let mut filter = Document::new();
    if let Some(day) = day {
        filter.insert("day", day);
    }
    let options = FindOptions::builder()
        .sort(doc! { "day": 1, "meal_type": 1 })
        .build();
    Ok(Json(find_all(&menus, filter, options).await?))
}

#[post("/mess/menu/<id>/vote", data = "<request>", format = "json")]
async fn vote_menu(
    token: AuthToken,
    id: Id,
    request: Json<MenuVoteRequest>,
    menus: Coll<MessMenu>,
) -> Result<Json<MessMenu>> {
    let mut menu = find_by_id(&menus, &id, "Menu").await?;
    menu.toggle_vote(&token.id, request.vote_type);
    menus
        .update_one(id.as_doc(), menu.votes_update(Utc::now()), None)
        .await?;
    Ok(Json(menu))
}

#[delete("/mess/menu/<id>")]
async fn delete_menu(
    _token: AuthToken<Management>,
    id: Id,
    menus: Coll<MessMenu>,
) -> Result<status::NoContent> {
    let result = menus.delete_one(id.as_doc(), None).await?;
    if result.deleted_count == 0 {
        return Err(Error::not_found("Menu"));
    }
    Ok(status::NoContent)
}

#[post("/mess/polls", data = "<request>", format = "json")]
async fn create_poll(
    token: AuthToken<Management>,
    request: Json<NewPollRequest>,
    polls: Coll<Poll>,
) -> Result<status::Created<Json<Poll>>> {
    request.validate()?;
    let poll = Poll::new(&token, request.0);
    polls.insert_one(&poll, None).await?;
    let location = format!("/api/mess/polls/{}", poll.id);
    Ok(status::Created::new(location).body(Json(poll)))
}

#[get("/mess/polls?<active_only>")]
async fn list_polls(
    _token: AuthToken,
    active_only: Option<bool>,
    polls: Coll<Poll>,
) -> Result<Json<Vec<Poll>>> {
    let filter = if active_only.unwrap_or(false) {
        Poll::open_filter(Utc::now())
    } else {
        Document::new()
    };
    Ok(Json(find_all(&polls, filter, newest(POLL_LIMIT)).await?))
}

#[post("/mess/polls/<id>/vote", data = "<request>", format = "json")]
async fn vote_poll(
    token: AuthToken,
    id: Id,
    request: Json<PollVoteRequest>,
    polls: Coll<Poll>,
) -> Result<Json<Poll>> {
    let poll = find_by_id(&polls, &id, "Poll").await?;
    let index = poll.check_vote(&token.id, &request.option_id, Utc::now())?;
    let (filter, update) = poll.vote_operation(&token.id, index);
    let result = polls.update_one(filter, update, None).await?;
    if result.modified_count == 0 {
        return Err(Error::conflict("Already voted"));
    }
    Ok(Json(find_by_id(&polls, &id, "Poll").await?))
}

#[post("/mess/polls/<id>/close")]
async fn close_poll(_token: AuthToken<Management>, id: Id, polls: Coll<Poll>) -> Result<Json<Poll>> {
    let result = polls
        .update_one(id.as_doc(), doc! { "$set": { "is_active": false } }, None)
        .await?;
    if result.matched_count == 0 {
        return Err(Error::not_found("Poll"));
    }
    Ok(Json(find_by_id(&polls, &id, "Poll").await?))
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
            db::mess_menu::{MealType, VoteDirection},
        },
    };

    use super::*;

    async fn post_menu(client: &Client, bearer: &Bearer, request: &MenuRequest) -> MessMenu {
        let response = client
            .post(uri!("/api", upsert_menu))
            .header(ContentType::JSON)
            .header(bearer.clone())
            .body(json!(request).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    async fn vote(client: &Client, bearer: &Bearer, menu: &Id, direction: &str) -> MessMenu {
        let response = client
            .post(uri!("/api", vote_menu(menu)))
            .header(ContentType::JSON)
            .header(bearer.clone())
            .body(json!({ "vote_type": direction }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test(management)]
    async fn upsert_keeps_votes(client: Client, bearer: Bearer) {
        let menu = post_menu(&client, &bearer, &MenuRequest::example()).await;
        let voted = vote(&client, &bearer, &menu.id, "up").await;
        assert_eq!(voted.votes_up, 1);

        let replaced = post_menu(
            &client,
            &bearer,
            &MenuRequest {
                items: vec!["Khichdi".to_string()],
                ..MenuRequest::example()
            },
        )
        .await;
        assert_eq!(replaced.id, menu.id);
        assert_eq!(replaced.items, vec!["Khichdi".to_string()]);
        assert_eq!(replaced.votes_up, 1);

        post_menu(
            &client,
            &bearer,
            &MenuRequest {
                day: DayOfWeek::Tuesday,
                meal_type: MealType::Lunch,
                ..MenuRequest::example()
            },
        )
        .await;
        let response = client
            .get("/api/mess/menu?day=Tuesday")
            .header(bearer)
            .dispatch()
            .await;
        let tuesday: Vec<MessMenu> = response.into_json().await.unwrap();
        assert_eq!(tuesday.len(), 1);
        assert_eq!(tuesday[0].meal_type, MealType::Lunch);
    }

    #[backend_test(management)]
    async fn menu_vote_toggles(client: Client, bearer: Bearer) {
        let menu = post_menu(&client, &bearer, &MenuRequest::example()).await;
        let student = sign_up(&client, &RegisterRequest::example_student()).await;

        let menu_after = vote(&client, &student, &menu.id, "up").await;
        assert_eq!((menu_after.votes_up, menu_after.votes_down), (1, 0));
        let menu_after = vote(&client, &student, &menu.id, "down").await;
        assert_eq!((menu_after.votes_up, menu_after.votes_down), (0, 1));
        let menu_after = vote(&client, &student, &menu.id, "down").await;
        assert_eq!((menu_after.votes_up, menu_after.votes_down), (0, 0));
        assert!(menu_after.voters.is_empty());

        let response = client
            .post(uri!("/api", vote_menu(&menu.id)))
            .header(ContentType::JSON)
            .header(student.clone())
            .body(json!({ "vote_type": "sideways" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());

        let response = client
            .post(uri!("/api", vote_menu(&Id::new())))
            .header(ContentType::JSON)
            .header(student)
            .body(json!({ "vote_type": VoteDirection::Up }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test(management)]
    async fn poll_lifecycle(client: Client, bearer: Bearer) {
        let response = client
            .post(uri!("/api", create_poll))
            .header(ContentType::JSON)
            .header(bearer.clone())
            .body(json!(NewPollRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Created, response.status());
        let poll: Poll = response.into_json().await.unwrap();
        let choice = poll.options[1].id.clone();

        let student = sign_up(&client, &RegisterRequest::example_student()).await;
        let cast = |option: Id| {
            let client = &client;
            let student = student.clone();
            let poll_id = poll.id.clone();
            async move {
                client
                    .post(uri!("/api", vote_poll(&poll_id)))
                    .header(ContentType::JSON)
                    .header(student)
                    .body(json!({ "option_id": option }).to_string())
                    .dispatch()
                    .await
            }
        };

        let response = cast(Id::new()).await;
        assert_eq!(Status::NotFound, response.status());

        let response = cast(choice.clone()).await;
        assert_eq!(Status::Ok, response.status());
        let voted: Poll = response.into_json().await.unwrap();
        assert_eq!(voted.total_votes, 1);
        assert_eq!(voted.options[1].votes, 1);

        let response = cast(poll.options[0].id.clone()).await;
        assert_eq!(Status::Conflict, response.status());

        let response = client
            .post(uri!("/api", close_poll(&poll.id)))
            .header(bearer.clone())
            .dispatch()
            .await;
        let closed: Poll = response.into_json().await.unwrap();
        assert!(!closed.is_active);

        let other = sign_up(&client, &RegisterRequest::example_other_student()).await;
        let response = client
            .post(uri!("/api", vote_poll(&poll.id)))
            .header(ContentType::JSON)
            .header(other)
            .body(json!({ "option_id": choice }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::BadRequest, response.status());
    }

    #[backend_test(management)]
    async fn active_polls_exclude_expired(client: Client, bearer: Bearer) {
        for expires_at in [None, Some(Utc::now() - Duration::minutes(5))] {
            let request = NewPollRequest {
                expires_at,
                ..NewPollRequest::example()
            };
            client
                .post(uri!("/api", create_poll))
                .header(ContentType::JSON)
                .header(bearer.clone())
                .body(json!(request).to_string())
                .dispatch()
                .await;
        }

        let response = client
            .get(uri!("/api", list_polls(Some(true))))
            .header(bearer.clone())
            .dispatch()
            .await;
        let active: Vec<Poll> = response.into_json().await.unwrap();
        assert_eq!(active.len(), 1);
        assert!(active[0].expires_at.is_none());

        let response = client
            .get(uri!("/api", list_polls(_)))
            .header(bearer)
            .dispatch()
            .await;
        let all: Vec<Poll> = response.into_json().await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
