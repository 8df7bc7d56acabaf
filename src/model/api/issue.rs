use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        db::issue::{IssueCategory, IssuePriority, IssueStatus, Visibility},
        mongodb::Id,
    },
};

pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_COMMENT_LENGTH: usize = 1000;

/// Check that `value` has between `min` and `max` characters.
pub(crate) fn check_length(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let length = value.trim().chars().count();
    if length < min {
        Err(Error::invalid(format!(
            "{field} must be at least {min} characters"
        )))
    } else if length > max {
        Err(Error::invalid(format!("{field} must be at most {max} characters")))
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIssueRequest {
    pub category: IssueCategory,
    pub priority: IssuePriority,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub visibility: Visibility,
}

impl NewIssueRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("Title", &self.title, 1, MAX_TITLE_LENGTH)?;
        check_length("Description", &self.description, 1, usize::MAX)
    }
}

/// A manager's change to an issue. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueUpdate {
    pub status: Option<IssueStatus>,
    pub assigned_to: Option<Id>,
    pub priority: Option<IssuePriority>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub text: String,
    pub parent_comment: Option<Id>,
}

impl CommentRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("Comment", &self.text, 1, MAX_COMMENT_LENGTH)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    pub rating: u8,
    pub comment: Option<String>,
}

impl FeedbackRequest {
    pub fn validate(&self) -> Result<()> {
        if (1..=5).contains(&self.rating) {
            Ok(())
        } else {
            Err(Error::invalid("Rating must be between 1 and 5"))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeResponse {
    pub likes_count: usize,
    pub has_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpvoteResponse {
    pub upvote_count: usize,
    pub has_upvoted: bool,
}

#[cfg(test)]
mod examples {
    use super::*;

    impl NewIssueRequest {
        pub fn example() -> Self {
            Self {
                category: IssueCategory::Plumbing,
                priority: IssuePriority::High,
                title: "Leaking tap in washroom".to_string(),
                description: "The tap on the second floor has been dripping all night.".to_string(),
                visibility: Visibility::Public,
            }
        }

        pub fn example_private() -> Self {
            Self {
                category: IssueCategory::Electrical,
                priority: IssuePriority::Medium,
                title: "Fan regulator broken".to_string(),
                description: "The regulator in my room only has one speed.".to_string(),
                visibility: Visibility::Private,
            }
        }
    }
}
