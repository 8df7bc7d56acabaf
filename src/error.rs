use argon2::Error as Argon2Error;
use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use mongodb::error::Error as DbError;
use reqwest::Error as HttpError;
use rocket::{
    http::Status,
    response::{self, status, Responder},
    serde::json::{json, Json, Value},
    Request,
};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Argon2(#[from] Argon2Error),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: impl AsRef<str>) -> Self {
        Self::Status(Status::NotFound, format!("{} not found", what.as_ref()))
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Status(Status::Forbidden, reason.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Status(Status::Conflict, reason.into())
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, reason.into())
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, reason.into())
    }

    /// A request body that parsed but failed validation.
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Status(Status::UnprocessableEntity, reason.into())
    }

    /// A third-party service we depend on failed.
    pub fn upstream(reason: impl Into<String>) -> Self {
        Self::Status(Status::BadGateway, reason.into())
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) | Self::Argon2(_) => Status::InternalServerError,
            Self::Jwt(_) => Status::Unauthorized,
            Self::Http(_) => Status::BadGateway,
            Self::Status(status, _) => *status,
        }
    }

    /// The reason shown to the client. Internal failures are not described.
    fn detail(&self) -> String {
        match self {
            Self::Db(_) | Self::Argon2(_) => "Internal server error".to_string(),
            Self::Jwt(_) => "Could not validate credentials".to_string(),
            Self::Http(_) => "Upstream service failed".to_string(),
            Self::Status(_, reason) => reason.clone(),
        }
    }
}

/// The JSON body of every error response.
pub fn error_body(status: Status, detail: &str) -> Value {
    json!({
        "status": status.code,
        "detail": detail,
    })
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        if status.class().is_server_error() {
            error!("{self}");
        } else {
            warn!("{self}");
        }
        status::Custom(status, Json(error_body(status, &self.detail()))).respond_to(req)
    }
}
