use std::{marker::PhantomData, ops::Deref};

use log::debug;
use mongodb::Database;
use rocket::{
    http::Status,
    request::{self, FromRequest},
    Request, State,
};

use crate::{
    config::Config,
    error::Error,
    logging::Caller,
    model::{db::user::User, mongodb::Coll},
};

use super::{
    claims::Claims,
    roles::{AnyRole, RoleSet},
};

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

/// An authenticated, active user whose role is in `R`.
pub struct AuthToken<R: RoleSet = AnyRole> {
    user: User,
    phantom: PhantomData<R>,
}

impl<R: RoleSet> AuthToken<R> {
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn into_user(self) -> User {
        self.user
    }
}

impl<R: RoleSet> Deref for AuthToken<R> {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

/// Load the active user named by the bearer token on `req`.
async fn authenticate(req: &Request<'_>) -> Result<User, Error> {
    let config = req.guard::<&State<Config>>().await.unwrap(); // Valid as `Config` is always managed
    let db = req.guard::<&State<Database>>().await.unwrap(); // Valid as `Database` is always managed

    let token = req
        .headers()
        .get_one(AUTHORIZATION_HEADER)
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or_else(|| Error::unauthorized("Not authenticated"))?;
    let claims = Claims::decode(token.trim(), config)?;

    let users = Coll::<User>::from_db(db);
    match users.find_one(claims.sub.as_doc(), None).await? {
        Some(user) if user.is_active => Ok(user),
        _ => Err(Error::unauthorized("User not found or inactive")),
    }
}

/// Server faults stay 500; anything else wrong with the token is a 401.
fn rejection_status(err: &Error) -> Status {
    if err.status() == Status::InternalServerError {
        Status::InternalServerError
    } else {
        Status::Unauthorized
    }
}

#[rocket::async_trait]
impl<'r, R: RoleSet> FromRequest<'r> for AuthToken<R> {
    type Error = Error;

    /// Verify the bearer token, load its user, and check the user's role.
    async fn from_request(req: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let user = match authenticate(req).await {
            Ok(user) => user,
            Err(e) => {
                let status = rejection_status(&e);
                debug!("Rejected bearer token: {e}");
                return request::Outcome::Failure((status, e));
            }
        };
        Caller::record(req, &user.id);
        if R::permits(user.role) {
            request::Outcome::Success(Self {
                user,
                phantom: PhantomData,
            })
        } else {
            request::Outcome::Failure((
                Status::Forbidden,
                Error::forbidden("Insufficient permissions"),
            ))
        }
    }
}
