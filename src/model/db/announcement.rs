use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::announcement::NewAnnouncementRequest,
    common::Role,
    db::{
        notification::{hostel_recipient, ALL_RECIPIENTS},
        user::User,
    },
    mongodb::Id,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnouncementPriority {
    Normal,
    Important,
    Urgent,
}

impl Default for AnnouncementPriority {
    fn default() -> Self {
        Self::Normal
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnouncementCategory {
    Maintenance,
    Schedule,
    Alert,
    General,
    Event,
}

impl Default for AnnouncementCategory {
    fn default() -> Self {
        Self::General
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetBlock {
    pub hostel: String,
    pub block: String,
}

/// Who an announcement is for. Empty lists everywhere means everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAudience {
    #[serde(default)]
    pub hostels: Vec<String>,
    #[serde(default)]
    pub blocks: Vec<TargetBlock>,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl TargetAudience {
    pub fn is_everyone(&self) -> bool {
        self.hostels.is_empty() && self.blocks.is_empty() && self.roles.is_empty()
    }

    /// Does this audience include the given user? Partial criteria are unioned.
    pub fn includes(&self, user: &User) -> bool {
        if self.is_everyone() || self.roles.contains(&user.role) {
            return true;
        }
        let Some(hostel) = user.hostel.as_deref() else {
            return false;
        };
        self.hostels.iter().any(|h| h == hostel)
            || self.blocks.iter().any(|target| {
                target.hostel == hostel && Some(target.block.as_str()) == user.block.as_deref()
            })
    }

    /// Notification recipient labels covering this audience.
    ///
    /// Block targets are addressed through their hostel group.
    pub fn recipients(&self) -> Vec<String> {
        if self.is_everyone() {
            return vec![ALL_RECIPIENTS.to_string()];
        }
        let mut recipients: Vec<String> = self.roles.iter().map(|r| r.to_string()).collect();
        let hostels = self
            .hostels
            .iter()
            .chain(self.blocks.iter().map(|b| &b.hostel));
        for hostel in hostels {
            let label = hostel_recipient(hostel);
            if !recipients.contains(&label) {
                recipients.push(label);
            }
        }
        recipients
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub user: Id,
    #[serde(with = "ts_milliseconds")]
    pub read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub priority: AnnouncementPriority,
    pub category: AnnouncementCategory,
    pub target_audience: TargetAudience,
    pub created_by: Id,
    pub created_by_name: String,
    pub is_pinned: bool,
    #[serde(with = "ts_milliseconds")]
    pub valid_from: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read_by: Vec<ReadReceipt>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Announcement {
    pub fn new(author: &User, request: NewAnnouncementRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            title: request.title,
            description: request.description,
            priority: request.priority,
            category: request.category,
            target_audience: request.target_audience,
            created_by: author.id.clone(),
            created_by_name: author.name.clone(),
            is_pinned: request.is_pinned,
            valid_from: now,
            expires_at: request.expires_at,
            read_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Is this announcement live at the given time?
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && self.expires_at.map_or(true, |expiry| expiry >= now)
    }

    pub fn is_read_by(&self, user: &Id) -> bool {
        self.read_by.iter().any(|receipt| &receipt.user == user)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn student(hostel: &str, block: &str) -> User {
        User {
            hostel: Some(hostel.to_string()),
            block: Some(block.to_string()),
            ..User::example_student()
        }
    }

    #[test]
    fn empty_audience_is_everyone() {
        let audience = TargetAudience::default();
        assert!(audience.includes(&student("A", "1")));
        assert!(audience.includes(&User::example_manager()));
        assert_eq!(audience.recipients(), vec!["all".to_string()]);
    }

    #[test]
    fn criteria_are_unioned() {
        let audience = TargetAudience {
            hostels: vec!["A".to_string()],
            blocks: vec![TargetBlock {
                hostel: "B".to_string(),
                block: "3".to_string(),
            }],
            roles: vec![Role::Management],
        };
        assert!(audience.includes(&student("A", "9")));
        assert!(audience.includes(&student("B", "3")));
        assert!(!audience.includes(&student("B", "1")));
        assert!(!audience.includes(&student("C", "3")));
        assert!(audience.includes(&User::example_manager()));
    }

    #[test]
    fn role_only_audience() {
        let audience = TargetAudience {
            roles: vec![Role::Student],
            ..Default::default()
        };
        assert!(audience.includes(&student("Z", "1")));
        assert!(!audience.includes(&User::example_manager()));
        assert_eq!(audience.recipients(), vec!["student".to_string()]);
    }

    #[test]
    fn recipients_deduplicate_hostels() {
        let audience = TargetAudience {
            hostels: vec!["A".to_string()],
            blocks: vec![TargetBlock {
                hostel: "A".to_string(),
                block: "2".to_string(),
            }],
            roles: vec![],
        };
        assert_eq!(audience.recipients(), vec!["hostel:A".to_string()]);
    }

    #[test]
    fn validity_window() {
        let now = Utc::now();
        let mut announcement =
            Announcement::new(&User::example_manager(), NewAnnouncementRequest::example());
        announcement.valid_from = now - Duration::hours(1);
        assert!(announcement.is_valid_at(now));

        announcement.expires_at = Some(now - Duration::minutes(1));
        assert!(!announcement.is_valid_at(now));

        announcement.expires_at = Some(now + Duration::minutes(1));
        assert!(announcement.is_valid_at(now));

        announcement.valid_from = now + Duration::minutes(1);
        assert!(!announcement.is_valid_at(now));
    }
}
