use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::Role,
    db::user::{AssignedArea, Expertise, ShiftTiming, User},
    mongodb::Id,
};

/// A user as shown to clients: everything except the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub hostel: Option<String>,
    pub block: Option<String>,
    pub room: Option<String>,
    pub profile_image: Option<String>,
    pub is_active: bool,
    pub email_verified: bool,
    pub expertise: Option<Vec<Expertise>>,
    pub assigned_areas: Option<Vec<AssignedArea>>,
    pub shift_timing: Option<ShiftTiming>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub last_login: Option<DateTime<Utc>>,
    pub login_count: u32,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            hostel: user.hostel,
            block: user.block,
            room: user.room,
            profile_image: user.profile_image,
            is_active: user.is_active,
            email_verified: user.email_verified,
            expertise: user.expertise,
            assigned_areas: user.assigned_areas,
            shift_timing: user.shift_timing,
            created_at: user.created_at,
            last_login: user.last_login,
            login_count: user.login_count,
        }
    }
}
