use std::collections::BTreeMap;

use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Utc,
};
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{api::mess::NewPollRequest, db::user::User, mongodb::Id},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: Id,
    pub text: String,
    pub votes: u32,
}

/// A multiple-choice poll. Each user votes once, and cannot change their vote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: Id,
    pub question: String,
    pub options: Vec<PollOption>,
    pub created_by: Id,
    pub is_active: bool,
    pub total_votes: u32,
    /// Voter ID to chosen option ID.
    #[serde(default)]
    pub voters: BTreeMap<Id, Id>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Poll {
    pub fn new(author: &User, request: NewPollRequest) -> Self {
        Self {
            id: Id::new(),
            question: request.question,
            options: request
                .options
                .into_iter()
                .map(|text| PollOption {
                    id: Id::new(),
                    text,
                    votes: 0,
                })
                .collect(),
            created_by: author.id.clone(),
            is_active: true,
            total_votes: 0,
            voters: BTreeMap::new(),
            expires_at: request.expires_at,
            created_at: Utc::now(),
        }
    }

    /// Is the poll accepting votes at the given time?
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |expiry| expiry > now)
    }

    /// Filter for polls accepting votes at the given time.
    pub fn open_filter(now: DateTime<Utc>) -> Document {
        doc! {
            "is_active": true,
            "$or": [
                { "expires_at": Bson::Null },
                { "expires_at": { "$gt": now.timestamp_millis() } },
            ],
        }
    }

    /// Check that `user` may vote for `option_id`, returning the option's index.
    pub fn check_vote(&self, user: &Id, option_id: &Id, now: DateTime<Utc>) -> Result<usize> {
        if !self.is_open_at(now) {
            return Err(Error::bad_request("Poll is closed"));
        }
        if self.voters.contains_key(user) {
            return Err(Error::conflict("Already voted"));
        }
        self.options
            .iter()
            .position(|option| &option.id == option_id)
            .ok_or_else(|| Error::not_found("Option"))
    }

    /// Filter and update recording a vote. The filter only matches while the
    /// user has not voted, so concurrent duplicates are rejected by the database.
    pub fn vote_operation(&self, user: &Id, option_index: usize) -> (Document, Document) {
        let voter_path = format!("voters.{user}");
        let mut filter = self.id.as_doc();
        filter.insert(voter_path.clone(), doc! { "$exists": false });

        let mut inc = doc! { "total_votes": 1 };
        inc.insert(format!("options.{option_index}.votes"), 1);
        let mut set = Document::new();
        set.insert(voter_path, &self.options[option_index].id);

        let update = doc! { "$inc": inc, "$set": set };
        (filter, update)
    }
}
