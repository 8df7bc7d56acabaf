use chrono::Utc;
use log::info;
use mongodb::bson::doc;
use rocket::{response::status, serde::json::Json, Route, State};

use crate::{
    config::Config,
    error::{Error, Result},
    model::{
        api::auth::{LoginRequest, ProfileUpdate, RegisterRequest, TokenResponse, UserView},
        auth::{AuthToken, Claims},
        db::user::User,
        mongodb::{errors::is_duplicate_key_error, Coll},
    },
};

use super::common::find_by_id;

pub fn routes() -> Vec<Route> {
    routes![register, login, me, update_me]
}

fn token_response(user: User, config: &Config) -> Result<TokenResponse> {
    let token = Claims::for_user(&user, config).encode(config)?;
    Ok(TokenResponse::new(token, user.into()))
}

#[post("/auth/register", data = "<request>", format = "json")]
async fn register(
    request: Json<RegisterRequest>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<status::Created<Json<TokenResponse>>> {
    request.validate()?;
    let user = request.0.into_user()?;

    // The unique index on `email` settles races between concurrent registrations.
    let existing = users.find_one(doc! { "email": &user.email }, None).await?;
    if existing.is_some() {
        return Err(Error::conflict("Email already registered"));
    }
    if let Err(e) = users.insert_one(&user, None).await {
        return Err(if is_duplicate_key_error(&e) {
            Error::conflict("Email already registered")
        } else {
            e.into()
        });
    }

    info!("Registered {} as {}", user.email, user.role);
    Ok(status::Created::new("/api/auth/me").body(Json(token_response(user, config)?)))
}

#[post("/auth/login", data = "<request>", format = "json")]
async fn login(
    request: Json<LoginRequest>,
    users: Coll<User>,
    config: &State<Config>,
) -> Result<Json<TokenResponse>> {
    let invalid = || Error::unauthorized("Invalid email or password");
    let user = users
        .find_one(request.user_filter(), None)
        .await?
        .ok_or_else(invalid)?;
    if !user.verify_password(&request.password)? {
        return Err(invalid());
    }
    if !user.is_active {
        return Err(Error::forbidden("Account is inactive"));
    }

    let now = Utc::now().timestamp_millis();
    users
        .update_one(
            user.id.as_doc(),
            doc! {
                "$set": { "last_login": now, "updated_at": now },
                "$inc": { "login_count": 1 },
            },
            None,
        )
        .await?;
    let user = find_by_id(&users, &user.id, "User").await?;
    Ok(Json(token_response(user, config)?))
}

#[get("/auth/me")]
async fn me(token: AuthToken) -> Json<UserView> {
    Json(token.into_user().into())
}

#[patch("/auth/me", data = "<update>", format = "json")]
async fn update_me(
    token: AuthToken,
    update: Json<ProfileUpdate>,
    users: Coll<User>,
) -> Result<Json<UserView>> {
    update.validate()?;
    users
        .update_one(token.id.as_doc(), doc! { "$set": update.set_fields() }, None)
        .await?;
    let user = find_by_id(&users, &token.id, "User").await?;
    Ok(Json(user.into()))
}
