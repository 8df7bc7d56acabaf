use chrono::{serde::ts_milliseconds, DateTime, Utc};
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{as_bson, bson_enum, Role},
    db::announcement::ReadReceipt,
    mongodb::Id,
};

/// Recipient label addressing every user.
pub const ALL_RECIPIENTS: &str = "all";

/// Recipient label addressing everyone living in a hostel.
pub fn hostel_recipient(hostel: &str) -> String {
    format!("hostel:{hostel}")
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    NewIssue,
    IssueAssigned,
    StatusUpdate,
    NewComment,
    IssueResolved,
    Announcement,
    Escalation,
    Reminder,
    GatePassRequest,
    GatePassUpdate,
}

/// An inbox entry. The recipient is either a user ID or a group label
/// (a role, a hostel, or everyone).
///
/// Group entries are shared, so read state is kept per user in `read_by`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Id,
    pub recipient: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub related_issue: Option<Id>,
    pub related_announcement: Option<Id>,
    pub related_id: Option<Id>,
    pub link: Option<String>,
    #[serde(default)]
    pub read_by: Vec<ReadReceipt>,
    pub priority: String,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        recipient: impl Into<String>,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Id::new(),
            recipient: recipient.into(),
            kind,
            title: title.into(),
            message: message.into(),
            related_issue: None,
            related_announcement: None,
            related_id: None,
            link: None,
            read_by: Vec::new(),
            priority: "Medium".to_string(),
            created_at: Utc::now(),
        }
    }

    /// Address a notification to every user with the given role.
    pub fn for_role(
        role: Role,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(role.as_str(), kind, title, message)
    }

    pub fn about_issue(mut self, issue_id: &Id) -> Self {
        self.related_issue = Some(issue_id.clone());
        self.link = Some(format!("/issues/{issue_id}"));
        self
    }

    pub fn about_announcement(mut self, announcement_id: &Id) -> Self {
        self.related_announcement = Some(announcement_id.clone());
        self.link = Some("/announcements".to_string());
        self
    }

    pub fn about(mut self, related_id: &Id, link: impl Into<String>) -> Self {
        self.related_id = Some(related_id.clone());
        self.link = Some(link.into());
        self
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    /// When `user` read this, if they have.
    pub fn read_receipt(&self, user: &Id) -> Option<&ReadReceipt> {
        self.read_by.iter().find(|receipt| &receipt.user == user)
    }

    /// Matches entries `user` has not read yet.
    pub fn unread_by(user: &Id) -> Document {
        doc! { "read_by.user": { "$ne": user } }
    }

    /// Record that `user` read an entry at `now`.
    pub fn read_update(user: &Id, now: DateTime<Utc>) -> Document {
        let receipt = ReadReceipt {
            user: user.clone(),
            read_at: now,
        };
        doc! { "$push": { "read_by": as_bson(&receipt) } }
    }
}

bson_enum!(NotificationType);
