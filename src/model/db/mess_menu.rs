use std::collections::BTreeMap;

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::mess::MenuRequest,
    common::{as_bson, bson_enum},
    mongodb::Id,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Snacks,
    Dinner,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

bson_enum!(DayOfWeek, MealType);

/// One meal on the weekly menu, keyed by `(day, meal_type)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessMenu {
    pub id: Id,
    pub day: DayOfWeek,
    pub meal_type: MealType,
    pub items: Vec<String>,
    #[serde(default)]
    pub special_items: Vec<String>,
    pub votes_up: u32,
    pub votes_down: u32,
    #[serde(default)]
    pub voters: BTreeMap<Id, VoteDirection>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl MessMenu {
    pub fn new(request: MenuRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            day: request.day,
            meal_type: request.meal_type,
            items: request.items,
            special_items: request.special_items,
            votes_up: 0,
            votes_down: 0,
            voters: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a vote from `user`.
    ///
    /// Repeating the current vote withdraws it; voting the other way moves it.
    /// Returns the user's vote after the toggle.
    pub fn toggle_vote(&mut self, user: &Id, direction: VoteDirection) -> Option<VoteDirection> {
        let result = match self.voters.get(user) {
            Some(previous) if *previous == direction => {
                self.voters.remove(user);
                None
            }
            _ => {
                self.voters.insert(user.clone(), direction);
                Some(direction)
            }
        };
        self.recount();
        result
    }

    fn recount(&mut self) {
        let ups = self
            .voters
            .values()
            .filter(|v| **v == VoteDirection::Up)
            .count();
        self.votes_up = ups as u32;
        self.votes_down = (self.voters.len() - ups) as u32;
    }

    /// The update document persisting the current vote state.
    pub fn votes_update(&self, now: DateTime<Utc>) -> Document {
        doc! {
            "$set": {
                "voters": as_bson(&self.voters),
                "votes_up": i64::from(self.votes_up),
                "votes_down": i64::from(self.votes_down),
                "updated_at": now.timestamp_millis(),
            }
        }
    }
}
