use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::issue::{CommentRequest, FeedbackRequest, IssueUpdate, NewIssueRequest},
    common::{as_bson, bson_enum, Location, MediaItem, Role},
    db::user::User,
    mongodb::Id,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromFormField)]
pub enum IssueCategory {
    Plumbing,
    Electrical,
    Cleanliness,
    Internet,
    Furniture,
    Security,
    Others,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromFormField)]
pub enum IssuePriority {
    Low,
    Medium,
    High,
    Emergency,
}

impl IssuePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Emergency => "Emergency",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromFormField)]
pub enum IssueStatus {
    Reported,
    Assigned,
    #[serde(rename = "In Progress")]
    #[field(value = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl IssueStatus {
    /// Statuses counted as outstanding work.
    pub const OPEN: [IssueStatus; 3] = [Self::Reported, Self::Assigned, Self::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reported => "Reported",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
pub enum Visibility {
    Public,
    Private,
}

impl Default for Visibility {
    fn default() -> Self {
        Self::Public
    }
}

bson_enum!(IssueCategory, IssuePriority, IssueStatus, Visibility);

/// One entry in an issue's append-only status log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub old_status: Option<IssueStatus>,
    pub new_status: IssueStatus,
    pub updated_by: Option<Id>,
    pub updated_by_name: Option<String>,
    pub remarks: Option<String>,
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl StatusChange {
    pub fn new(
        old_status: Option<IssueStatus>,
        new_status: IssueStatus,
        actor: &User,
        remarks: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            old_status,
            new_status,
            updated_by: Some(actor.id.clone()),
            updated_by_name: Some(actor.name.clone()),
            remarks,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub user_id: Id,
    pub user_name: String,
    pub user_role: Role,
    pub text: String,
    pub parent_comment: Option<Id>,
    #[serde(default)]
    pub likes: Vec<Id>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: &User, request: CommentRequest) -> Self {
        Self {
            id: Id::new(),
            user_id: author.id.clone(),
            user_name: author.name.clone(),
            user_role: author.role,
            text: request.text.trim().to_string(),
            parent_comment: request.parent_comment,
            likes: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// A suggested classification for an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuePrediction {
    pub category: IssueCategory,
    pub priority: IssuePriority,
    pub confidence_score: f64,
    pub estimated_resolution_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolved_by: Id,
    pub resolved_by_name: String,
    pub resolution_notes: Option<String>,
    #[serde(default)]
    pub resolution_media: Vec<MediaItem>,
    #[serde(with = "ts_milliseconds")]
    pub resolved_at: DateTime<Utc>,
}

impl Resolution {
    /// A resolution by `actor`, carrying over notes and media from any earlier
    /// resolution of the same issue.
    pub fn new(actor: &User, previous: Option<&Resolution>, resolved_at: DateTime<Utc>) -> Self {
        Self {
            resolved_by: actor.id.clone(),
            resolved_by_name: actor.name.clone(),
            resolution_notes: previous.and_then(|p| p.resolution_notes.clone()),
            resolution_media: previous
                .map(|p| p.resolution_media.clone())
                .unwrap_or_default(),
            resolved_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub rating: u8,
    pub comment: Option<String>,
    #[serde(with = "ts_milliseconds")]
    pub submitted_at: DateTime<Utc>,
}

impl From<FeedbackRequest> for Feedback {
    fn from(request: FeedbackRequest) -> Self {
        Self {
            rating: request.rating,
            comment: request.comment,
            submitted_at: Utc::now(),
        }
    }
}

/// A maintenance ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: Id,
    pub ticket_id: String,
    pub reporter_id: Id,
    pub reporter_name: String,
    pub reporter_email: String,
    pub category: IssueCategory,
    pub priority: IssuePriority,
    pub title: String,
    pub description: String,
    pub status: IssueStatus,
    pub visibility: Visibility,
    pub location: Location,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    pub assigned_to: Option<Id>,
    pub assigned_to_name: Option<String>,
    pub ai_predictions: Option<IssuePrediction>,
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub resolution: Option<Resolution>,
    pub feedback: Option<Feedback>,
    #[serde(with = "ts_milliseconds")]
    pub reported_at: DateTime<Utc>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_duplicate: bool,
    pub merged_with: Option<Id>,
    #[serde(default)]
    pub merged_issues: Vec<Id>,
    #[serde(default)]
    pub views: u32,
    #[serde(default)]
    pub upvotes: Vec<Id>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

/// Human-readable ticket number derived from the report time.
pub fn ticket_id(at: DateTime<Utc>) -> String {
    format!("HST-{}", at.format("%y%m%d-%H%M%S"))
}

impl Issue {
    /// A freshly reported issue, with the reporter's location snapshotted onto it.
    pub fn new(
        reporter: &User,
        request: NewIssueRequest,
        prediction: Option<IssuePrediction>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            ticket_id: ticket_id(now),
            reporter_id: reporter.id.clone(),
            reporter_name: reporter.name.clone(),
            reporter_email: reporter.email.clone(),
            category: request.category,
            priority: request.priority,
            title: request.title,
            description: request.description,
            status: IssueStatus::Reported,
            visibility: request.visibility,
            location: reporter.location(),
            media: Vec::new(),
            assigned_to: None,
            assigned_to_name: None,
            ai_predictions: prediction,
            status_history: vec![StatusChange::new(
                None,
                IssueStatus::Reported,
                reporter,
                Some("Issue reported".to_string()),
                now,
            )],
            comments: Vec::new(),
            resolution: None,
            feedback: None,
            reported_at: now,
            closed_at: None,
            is_duplicate: false,
            merged_with: None,
            merged_issues: Vec::new(),
            views: 0,
            upvotes: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Can the given user read this issue?
    ///
    /// Managers see everything. Students see their own issues, and public
    /// issues raised in their hostel.
    pub fn is_visible_to(&self, user: &User) -> bool {
        match user.role {
            Role::Management => true,
            Role::Student => {
                self.reporter_id == user.id
                    || (self.visibility == Visibility::Public
                        && user.hostel.as_deref() == Some(self.location.hostel.as_str()))
            }
        }
    }

    /// The filter equivalent of [`Issue::is_visible_to`], or `None` if the user
    /// can see every issue.
    pub fn visibility_filter(user: &User) -> Option<Document> {
        match user.role {
            Role::Management => None,
            Role::Student => {
                let hostel = user.hostel.clone().map(Bson::String).unwrap_or(Bson::Null);
                Some(doc! {
                    "$or": [
                        { "reporter_id": &user.id },
                        { "visibility": Visibility::Public, "location.hostel": hostel },
                    ]
                })
            }
        }
    }

    /// Build the update document applying a manager's status change.
    ///
    /// `assignee` is the resolved user named by `update.assigned_to`, if any.
    pub fn status_update(
        &self,
        actor: &User,
        update: &IssueUpdate,
        assignee: Option<&User>,
        now: DateTime<Utc>,
    ) -> Document {
        let mut set = doc! { "updated_at": now.timestamp_millis() };
        let mut result = Document::new();

        if let Some(status) = update.status {
            set.insert("status", status);
            let change = StatusChange::new(
                Some(self.status),
                status,
                actor,
                update.remarks.clone(),
                now,
            );
            result.insert("$push", doc! { "status_history": as_bson(&change) });

            match status {
                IssueStatus::Resolved => {
                    let resolution = Resolution::new(actor, self.resolution.as_ref(), now);
                    set.insert("resolution", as_bson(&resolution));
                }
                IssueStatus::Closed => {
                    set.insert("closed_at", now.timestamp_millis());
                }
                _ => {}
            }
        }

        if let Some(assignee) = assignee {
            set.insert("assigned_to", &assignee.id);
            set.insert("assigned_to_name", assignee.name.clone());
        }

        if let Some(priority) = update.priority {
            set.insert("priority", priority);
        }

        result.insert("$set", set);
        result
    }

    /// Build the update documents for merging `duplicate` into this issue:
    /// first the update for `self`, then the update for the duplicate.
    pub fn merge_updates(
        &self,
        duplicate: &Issue,
        actor: &User,
        now: DateTime<Utc>,
    ) -> (Document, Document) {
        let canonical_entry = StatusChange::new(
            Some(self.status),
            self.status,
            actor,
            Some(format!("Merged duplicate issue {}", duplicate.id)),
            now,
        );
        let canonical_update = doc! {
            "$push": {
                "merged_issues": &duplicate.id,
                "status_history": as_bson(&canonical_entry),
            },
            "$set": { "updated_at": now.timestamp_millis() },
        };

        let duplicate_entry = StatusChange::new(
            Some(duplicate.status),
            IssueStatus::Closed,
            actor,
            Some(format!("Merged into issue {}", self.id)),
            now,
        );
        let duplicate_update = doc! {
            "$push": { "status_history": as_bson(&duplicate_entry) },
            "$set": {
                "status": IssueStatus::Closed,
                "is_duplicate": true,
                "merged_with": &self.id,
                "closed_at": now.timestamp_millis(),
                "updated_at": now.timestamp_millis(),
            },
        };

        (canonical_update, duplicate_update)
    }

    pub fn comment(&self, comment_id: &Id) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == comment_id)
    }

    /// Can this issue still receive feedback from its reporter?
    pub fn accepts_feedback(&self) -> bool {
        matches!(self.status, IssueStatus::Resolved | IssueStatus::Closed)
    }
}

/// Flip `user`'s membership of a like/upvote set, returning whether they are now a member.
pub fn toggle_membership(members: &mut Vec<Id>, user: &Id) -> bool {
    if let Some(index) = members.iter().position(|m| m == user) {
        members.remove(index);
        false
    } else {
        members.push(user.clone());
        true
    }
}


#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use mongodb::bson::from_bson;

    use super::*;

    fn in_hostel(hostel: &str) -> User {
        User {
            id: Id::new(),
            hostel: Some(hostel.to_string()),
            ..User::example_student()
        }
    }

    #[test]
    fn ticket_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(ticket_id(at), "HST-240309-140507");
    }

    #[test]
    fn new_issue_snapshot() {
        let reporter = User::example_student();
        let issue = Issue::example(&reporter);
        assert_eq!(issue.status, IssueStatus::Reported);
        assert_eq!(issue.location.hostel, "A");
        assert_eq!(issue.location.room, "205");
        assert_eq!(issue.status_history.len(), 1);
        let first = &issue.status_history[0];
        assert_eq!(first.old_status, None);
        assert_eq!(first.new_status, IssueStatus::Reported);
        assert_eq!(first.remarks.as_deref(), Some("Issue reported"));
    }

    #[test]
    fn unset_location_becomes_placeholder() {
        let manager = User::example_manager();
        let issue = Issue::example(&manager);
        assert_eq!(issue.location, Location::from_parts(None, None, None));
    }

    #[test]
    fn visibility_is_hostel_scoped() {
        let reporter = in_hostel("A");
        let neighbour = in_hostel("A");
        let outsider = in_hostel("B");
        let manager = User::example_manager();

        let mut issue = Issue::example(&reporter);
        assert!(issue.is_visible_to(&reporter));
        assert!(issue.is_visible_to(&neighbour));
        assert!(!issue.is_visible_to(&outsider));
        assert!(issue.is_visible_to(&manager));

        issue.visibility = Visibility::Private;
        assert!(issue.is_visible_to(&reporter));
        assert!(!issue.is_visible_to(&neighbour));
        assert!(issue.is_visible_to(&manager));
    }

    #[test]
    fn filter_only_for_students() {
        assert!(Issue::visibility_filter(&User::example_manager()).is_none());
        let student = in_hostel("B");
        let filter = Issue::visibility_filter(&student).unwrap();
        let clauses = filter.get_array("$or").unwrap();
        assert_eq!(clauses.len(), 2);
        assert_eq!(
            clauses[1].as_document().unwrap().get_str("location.hostel"),
            Ok("B")
        );
    }

    #[test]
    fn resolving_builds_full_resolution() {
        let reporter = User::example_student();
        let manager = User::example_manager();
        let mut issue = Issue::example(&reporter);
        issue.resolution = Some(Resolution {
            resolution_notes: Some("Replaced washer".to_string()),
            ..Resolution::new(&manager, None, Utc::now())
        });

        let update = IssueUpdate {
            status: Some(IssueStatus::Resolved),
            remarks: Some("done".to_string()),
            ..Default::default()
        };
        let now = Utc::now();
        let doc = issue.status_update(&manager, &update, None, now);

        let set = doc.get_document("$set").unwrap();
        assert_eq!(set.get_str("status"), Ok("Resolved"));
        let resolution: Resolution =
            from_bson(set.get("resolution").unwrap().clone()).unwrap();
        assert_eq!(resolution.resolved_by, manager.id);
        assert_eq!(resolution.resolution_notes.as_deref(), Some("Replaced washer"));

        let history = doc.get_document("$push").unwrap();
        let change: StatusChange =
            from_bson(history.get("status_history").unwrap().clone()).unwrap();
        assert_eq!(change.old_status, Some(IssueStatus::Reported));
        assert_eq!(change.new_status, IssueStatus::Resolved);
        assert_eq!(change.remarks.as_deref(), Some("done"));
    }

    #[test]
    fn closing_sets_closed_at() {
        let issue = Issue::example(&User::example_student());
        let update = IssueUpdate {
            status: Some(IssueStatus::Closed),
            ..Default::default()
        };
        let now = Utc::now();
        let doc = issue.status_update(&User::example_manager(), &update, None, now);
        let set = doc.get_document("$set").unwrap();
        assert_eq!(set.get_i64("closed_at"), Ok(now.timestamp_millis()));
        assert!(set.get("resolution").is_none());
    }

    #[test]
    fn assignment_without_status_leaves_history() {
        let issue = Issue::example(&User::example_student());
        let staff = User::example_manager();
        let update = IssueUpdate {
            assigned_to: Some(staff.id.clone()),
            priority: Some(IssuePriority::Emergency),
            ..Default::default()
        };
        let doc = issue.status_update(&staff, &update, Some(&staff), Utc::now());
        assert!(doc.get("$push").is_none());
        let set = doc.get_document("$set").unwrap();
        assert_eq!(set.get_str("assigned_to"), Ok(staff.id.as_str()));
        assert_eq!(set.get_str("assigned_to_name"), Ok(staff.name.as_str()));
        assert_eq!(set.get_str("priority"), Ok("Emergency"));
    }

    #[test]
    fn merge_closes_duplicate_only() {
        let reporter = User::example_student();
        let manager = User::example_manager();
        let canonical = Issue::example(&reporter);
        let duplicate = Issue::example(&reporter);

        let (main, dup) = canonical.merge_updates(&duplicate, &manager, Utc::now());

        let main_push = main.get_document("$push").unwrap();
        assert_eq!(main_push.get_str("merged_issues"), Ok(duplicate.id.as_str()));
        assert!(main.get_document("$set").unwrap().get("status").is_none());
        let entry: StatusChange =
            from_bson(main_push.get("status_history").unwrap().clone()).unwrap();
        assert_eq!(entry.old_status, Some(entry.new_status));

        let dup_set = dup.get_document("$set").unwrap();
        assert_eq!(dup_set.get_str("status"), Ok("Closed"));
        assert_eq!(dup_set.get_bool("is_duplicate"), Ok(true));
        assert_eq!(dup_set.get_str("merged_with"), Ok(canonical.id.as_str()));
    }

    #[test]
    fn toggling_membership() {
        let user = Id::new();
        let mut likes = vec![Id::new()];
        assert!(toggle_membership(&mut likes, &user));
        assert_eq!(likes.len(), 2);
        assert!(!toggle_membership(&mut likes, &user));
        assert_eq!(likes.len(), 1);
    }
}
