use chrono::Utc;
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        api::phone::Phone,
        common::Role,
        db::user::{hash_password, AssignedArea, Expertise, ShiftTiming, User},
        mongodb::Id,
    },
};

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// A new account, received from a user. The password is in plaintext and is
/// never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<Phone>,
    pub hostel: Option<String>,
    pub block: Option<String>,
    pub room: Option<String>,
    pub profile_image: Option<String>,
    pub expertise: Option<Vec<Expertise>>,
    pub assigned_areas: Option<Vec<AssignedArea>>,
    pub shift_timing: Option<ShiftTiming>,
}

/// Loose email check; deliverability is not our problem.
fn check_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(Error::invalid(format!("Invalid email address: {email}"))),
    }
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("Name must not be empty"));
        }
        check_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(Error::invalid(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        Ok(())
    }

    /// Convert into a new [`User`] by hashing the password.
    pub fn into_user(self) -> Result<User> {
        let now = Utc::now();
        Ok(User {
            id: Id::new(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: self.phone.map(String::from),
            role: self.role,
            hostel: self.hostel,
            block: self.block,
            room: self.room,
            profile_image: self.profile_image,
            password_hash: hash_password(&self.password)?,
            is_active: true,
            email_verified: false,
            expertise: self.expertise,
            assigned_areas: self.assigned_areas,
            shift_timing: self.shift_timing,
            created_at: now,
            updated_at: now,
            last_login: None,
            login_count: 0,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Filter matching the account this login is for.
    pub fn user_filter(&self) -> Document {
        doc! { "email": self.email.trim().to_lowercase() }
    }
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<Phone>,
    pub hostel: Option<String>,
    pub block: Option<String>,
    pub room: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<()> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(Error::invalid("Name must not be empty"));
        }
        Ok(())
    }

    /// The `$set` contents for this update. Absent fields are left alone.
    pub fn set_fields(&self) -> Document {
        let mut set = doc! { "updated_at": Utc::now().timestamp_millis() };
        let fields = [
            ("name", self.name.as_ref().map(|n| n.trim().to_string())),
            ("phone", self.phone.clone().map(String::from)),
            ("hostel", self.hostel.clone()),
            ("block", self.block.clone()),
            ("room", self.room.clone()),
            ("profile_image", self.profile_image.clone()),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                set.insert(key, value);
            }
        }
        set
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_validation() {
        assert!(RegisterRequest::example_student().validate().is_ok());

        let short = RegisterRequest {
            password: "12345".to_string(),
            ..RegisterRequest::example_student()
        };
        assert_eq!(short.validate().unwrap_err().status().code, 422);

        let bad_email = RegisterRequest {
            email: "asha.example.edu".to_string(),
            ..RegisterRequest::example_student()
        };
        assert!(bad_email.validate().is_err());

        let no_name = RegisterRequest {
            name: "  ".to_string(),
            ..RegisterRequest::example_student()
        };
        assert!(no_name.validate().is_err());
    }

    #[test]
    fn new_user_is_active_and_hashed() {
        let request = RegisterRequest::example_student();
        let password = request.password.clone();
        let user = request.into_user().unwrap();
        assert!(user.is_active);
        assert_ne!(user.password_hash, password);
        assert!(user.verify_password(&password).unwrap());
        assert_eq!(user.login_count, 0);
    }

    #[test]
    fn profile_update_sets_only_given_fields() {
        let update = ProfileUpdate {
            room: Some("310".to_string()),
            ..Default::default()
        };
        let set = update.set_fields();
        assert_eq!(set.get_str("room"), Ok("310"));
        assert!(!set.contains_key("name"));
        assert!(set.contains_key("updated_at"));
    }
}
