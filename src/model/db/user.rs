use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    model::{
        common::{Location, Role},
        mongodb::Id,
    },
};

/// Maintenance trades a staff member can cover.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expertise {
    Plumbing,
    Electrical,
    Carpentry,
    Cleaning,
    Internet,
    General,
}

/// Part of a hostel a staff member is responsible for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedArea {
    pub hostel: String,
    pub blocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTiming {
    pub start: String,
    pub end: String,
}

/// A user account, as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub hostel: Option<String>,
    pub block: Option<String>,
    pub room: Option<String>,
    pub profile_image: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
    pub email_verified: bool,
    #[serde(default)]
    pub expertise: Option<Vec<Expertise>>,
    #[serde(default)]
    pub assigned_areas: Option<Vec<AssignedArea>>,
    #[serde(default)]
    pub shift_timing: Option<ShiftTiming>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub login_count: u32,
}

impl User {
    /// Check whether the given password is correct.
    pub fn verify_password<T: AsRef<[u8]>>(&self, password: T) -> Result<bool> {
        Ok(argon2::verify_encoded(
            &self.password_hash,
            password.as_ref(),
        )?)
    }

    /// The user's location, with gaps filled in.
    pub fn location(&self) -> Location {
        Location::from_parts(
            self.hostel.as_deref(),
            self.block.as_deref(),
            self.room.as_deref(),
        )
    }

    /// Notification recipient labels that address this user: their own ID,
    /// their role group, their hostel group, and everyone.
    pub fn recipient_labels(&self) -> Vec<String> {
        let mut labels = vec![
            self.id.to_string(),
            self.role.as_str().to_string(),
            super::notification::ALL_RECIPIENTS.to_string(),
        ];
        if let Some(hostel) = &self.hostel {
            labels.push(super::notification::hostel_recipient(hostel));
        }
        labels
    }
}

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    // 16 bytes is recommended for password hashing:
    //  https://en.wikipedia.org/wiki/Argon2
    let mut salt = [0_u8; 16];
    rand::thread_rng().fill(&mut salt);
    Ok(argon2::hash_encoded(
        password.as_bytes(),
        &salt,
        &argon2::Config::default(),
    )?)
}

/// Example data for tests.
#[cfg(test)]
mod examples {
    use super::*;

    impl User {
        pub fn example_student() -> Self {
            let now = Utc::now();
            Self {
                id: Id::new(),
                name: "Asha Rao".to_string(),
                email: "asha@example.edu".to_string(),
                phone: None,
                role: Role::Student,
                hostel: Some("A".to_string()),
                block: Some("2".to_string()),
                room: Some("205".to_string()),
                profile_image: None,
                password_hash: hash_password("hostel-life").unwrap(),
                is_active: true,
                email_verified: false,
                expertise: None,
                assigned_areas: None,
                shift_timing: None,
                created_at: now,
                updated_at: now,
                last_login: None,
                login_count: 0,
            }
        }

        pub fn example_manager() -> Self {
            Self {
                name: "Warden Iyer".to_string(),
                email: "warden@example.edu".to_string(),
                role: Role::Management,
                hostel: None,
                block: None,
                room: None,
                ..Self::example_student()
            }
        }
    }
}
