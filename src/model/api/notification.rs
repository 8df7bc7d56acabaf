use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use serde::{Deserialize, Serialize};

use crate::model::{
    db::notification::{Notification, NotificationType},
    mongodb::Id,
};

/// A notification as seen by one user, with that user's read state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationView {
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
    pub is_read: bool,
    #[serde(default, with = "ts_milliseconds_option")]
    pub read_at: Option<DateTime<Utc>>,
    pub priority: String,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl NotificationView {
    pub fn for_user(notification: Notification, user: &Id) -> Self {
        let read_at = notification.read_receipt(user).map(|receipt| receipt.read_at);
        Self {
            id: notification.id,
            recipient: notification.recipient,
            kind: notification.kind,
            title: notification.title,
            message: notification.message,
            related_issue: notification.related_issue,
            related_announcement: notification.related_announcement,
            related_id: notification.related_id,
            link: notification.link,
            is_read: read_at.is_some(),
            read_at,
            priority: notification.priority,
            created_at: notification.created_at,
        }
    }
}
