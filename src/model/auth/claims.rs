use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::Result,
    model::{common::Role, db::user::User, mongodb::Id},
};

/// The claims carried by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Id,
    pub email: String,
    pub role: Role,
    #[serde(rename = "exp", with = "ts_seconds")]
    pub expire_at: DateTime<Utc>,
}

impl Claims {
    /// Claims for `user`, valid for the configured lifetime.
    pub fn for_user(user: &User, config: &Config) -> Self {
        Self {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            expire_at: Utc::now() + config.auth_ttl(),
        }
    }

    /// Sign these claims with HS256.
    pub fn encode(&self, config: &Config) -> Result<String> {
        Ok(jsonwebtoken::encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?)
    }

    /// Verify a token's signature and expiry and return its claims.
    pub fn decode(token: &str, config: &Config) -> Result<Self> {
        Ok(jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )?
        .claims)
    }
}
