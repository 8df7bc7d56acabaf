use mongodb::{bson::doc, options::FindOptions};
use rocket::{serde::json::Json, Route, State};

use crate::{
    ai::AiService,
    error::Result,
    model::{
        api::ai::{CategorizeRequest, ChatRequest, ChatResponse},
        auth::AuthToken,
        db::{conversation::Conversation, issue::IssuePrediction},
        mongodb::Coll,
    },
};

use super::common::find_all;

pub fn routes() -> Vec<Route> {
    routes![chat, list_conversations, categorize]
}

#[post("/ai/chat", data = "<request>", format = "json")]
async fn chat(
    token: AuthToken,
    request: Json<ChatRequest>,
    ai: &State<AiService>,
    conversations: Coll<Conversation>,
) -> Result<Json<ChatResponse>> {
    request.validate()?;
    let session_id = request.session();
    let response = ai.chat(&token, &request.message).await;

    let exchange = Conversation::exchange(
        &token.id,
        session_id.clone(),
        request.0.message,
        response.clone(),
    );
    conversations.insert_one(exchange, None).await?;

    Ok(Json(ChatResponse {
        session_id,
        response,
    }))
}

/// The caller's stored exchanges, oldest first.
#[get("/ai/conversations?<session_id>")]
async fn list_conversations(
    token: AuthToken,
    session_id: Option<String>,
    conversations: Coll<Conversation>,
) -> Result<Json<Vec<Conversation>>> {
    let mut filter = doc! { "user_id": &token.id };
    if let Some(session_id) = session_id {
        filter.insert("session_id", session_id);
    }
    let options = FindOptions::builder()
        .sort(doc! { "created_at": 1, "_id": 1 })
        .build();
    Ok(Json(find_all(&conversations, filter, options).await?))
}

#[post("/ai/categorize", data = "<request>", format = "json")]
async fn categorize(
    _token: AuthToken,
    request: Json<CategorizeRequest>,
    ai: &State<AiService>,
) -> Json<IssuePrediction> {
    Json(ai.categorize(&request.title, &request.description).await)
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

    async fn say(
        client: &Client,
        bearer: &Bearer,
        message: &str,
        session: Option<&str>,
    ) -> ChatResponse {
        let response = client
            .post(uri!("/api", chat))
            .header(ContentType::JSON)
            .header(bearer.clone())
            .body(json!({ "message": message, "session_id": session }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        response.into_json().await.unwrap()
    }

    #[backend_test(student)]
    async fn chat_sessions_are_stored(client: Client, bearer: Bearer) {
        let first = say(&client, &bearer, "Hello there", None).await;
        assert!(!first.session_id.is_empty());
        assert!(!first.response.is_empty());

        let session = Some(first.session_id.as_str());
        let second = say(&client, &bearer, "When is the laundry free?", session).await;
        assert_eq!(second.session_id, first.session_id);
        say(&client, &bearer, "Unrelated", None).await;

        let response = client
            .get(uri!("/api", list_conversations(Some(first.session_id.as_str()))))
            .header(bearer.clone())
            .dispatch()
            .await;
        let stored: Vec<Conversation> = response.into_json().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].messages[0].content, "Hello there");
        assert_eq!(stored[0].messages[1].content, first.response);

        let other = sign_up(&client, &RegisterRequest::example_other_student()).await;
        let response = client
            .get(uri!("/api", list_conversations(_)))
            .header(other)
            .dispatch()
            .await;
        let theirs: Vec<Conversation> = response.into_json().await.unwrap();
        assert!(theirs.is_empty());
    }

    #[backend_test(student)]
    async fn empty_message(client: Client, bearer: Bearer) {
        let response = client
            .post(uri!("/api", chat))
            .header(ContentType::JSON)
            .header(bearer)
            .body(json!({ "message": "   " }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::UnprocessableEntity, response.status());
    }

    #[backend_test(student)]
    async fn categorize_always_answers(client: Client, bearer: Bearer) {
        let response = client
            .post(uri!("/api", categorize))
            .header(ContentType::JSON)
            .header(bearer)
            .body(json!({ "title": "Tap leaking", "description": "Water everywhere" }).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let prediction: IssuePrediction = response.into_json().await.unwrap();
        assert!((0.0..=1.0).contains(&prediction.confidence_score));
        assert!(prediction.estimated_resolution_hours > 0.0);
    }
}
