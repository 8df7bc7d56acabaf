use rocket::http::Header;
use serde::{Deserialize, Serialize};

use super::UserView;

pub const TOKEN_TYPE: &str = "bearer";

/// The body returned on successful registration or login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserView,
}

impl TokenResponse {
    pub fn new(access_token: String, user: UserView) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            user,
        }
    }
}

/// A bearer token as sent by a client.
#[derive(Debug, Clone)]
pub struct Bearer(String);

impl Bearer {
    pub fn new(token: String) -> Self {
        Self(token)
    }
}

impl From<Bearer> for Header<'static> {
    fn from(bearer: Bearer) -> Self {
        Header::new("Authorization", format!("Bearer {}", bearer.0))
    }
}
