mod request;
mod token;
mod user;

pub use request::{LoginRequest, ProfileUpdate, RegisterRequest, MIN_PASSWORD_LENGTH};
pub use token::{Bearer, TokenResponse, TOKEN_TYPE};
pub use user::UserView;
