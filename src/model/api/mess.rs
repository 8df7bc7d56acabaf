use chrono::{serde::ts_milliseconds_option, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        db::mess_menu::{DayOfWeek, MealType, VoteDirection},
        mongodb::Id,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuRequest {
    pub day: DayOfWeek,
    pub meal_type: MealType,
    pub items: Vec<String>,
    #[serde(default)]
    pub special_items: Vec<String>,
}

impl MenuRequest {
    pub fn validate(&self) -> Result<()> {
        if self.items.iter().all(|item| item.trim().is_empty()) {
            return Err(Error::invalid("Menu must list at least one item"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuVoteRequest {
    pub vote_type: VoteDirection,
}

pub const MIN_POLL_OPTIONS: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPollRequest {
    pub question: String,
    pub options: Vec<String>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewPollRequest {
    pub fn validate(&self) -> Result<()> {
        if self.question.trim().is_empty() {
            return Err(Error::invalid("Question must not be empty"));
        }
        if self.options.len() < MIN_POLL_OPTIONS {
            return Err(Error::invalid(format!(
                "A poll needs at least {MIN_POLL_OPTIONS} options"
            )));
        }
        if self.options.iter().any(|option| option.trim().is_empty()) {
            return Err(Error::invalid("Poll options must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollVoteRequest {
    pub option_id: Id,
}
