use chrono::{
    serde::{ts_milliseconds, ts_milliseconds_option},
    DateTime, Duration, Utc,
};
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

use crate::model::{api::laundry::NewMachineRequest, common::bson_enum, db::user::User, mongodb::Id};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Available,
    #[serde(rename = "In Use")]
    InUse,
    Maintenance,
}

bson_enum!(MachineStatus);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaundryMachine {
    pub id: Id,
    pub block: String,
    pub floor: String,
    pub machine_number: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: MachineStatus,
    pub current_user_id: Option<Id>,
    pub current_user_name: Option<String>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl LaundryMachine {
    pub fn new(request: NewMachineRequest) -> Self {
        let now = Utc::now();
        Self {
            id: Id::new(),
            block: request.block,
            floor: request.floor,
            machine_number: request.machine_number,
            kind: request.kind,
            status: MachineStatus::Available,
            current_user_id: None,
            current_user_name: None,
            start_time: None,
            end_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Is the machine reserved past its end time?
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == MachineStatus::InUse && self.end_time.map_or(false, |end| now > end)
    }

    /// Free the machine if its reservation has run out, returning whether it did.
    pub fn release_if_expired(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_expired(now) {
            self.clear(MachineStatus::Available);
            true
        } else {
            false
        }
    }

    /// Can `actor` end the current reservation?
    pub fn can_release(&self, actor: &User) -> bool {
        actor.role.is_management() || self.current_user_id.as_ref() == Some(&actor.id)
    }

    fn clear(&mut self, status: MachineStatus) {
        self.status = status;
        self.current_user_id = None;
        self.current_user_name = None;
        self.start_time = None;
        self.end_time = None;
    }

    /// Filter matching a machine that can be reserved now: free, or holding an
    /// expired reservation.
    pub fn reservable_filter(id: &Id, now: DateTime<Utc>) -> Document {
        doc! {
            "id": id,
            "$or": [
                { "status": MachineStatus::Available },
                { "status": MachineStatus::InUse, "end_time": { "$lt": now.timestamp_millis() } },
            ],
        }
    }

    /// Update reserving a machine for `user` from `now` for `duration`.
    pub fn reservation(user: &User, now: DateTime<Utc>, duration: Duration) -> Document {
        doc! {
            "$set": {
                "status": MachineStatus::InUse,
                "current_user_id": &user.id,
                "current_user_name": user.name.clone(),
                "start_time": now.timestamp_millis(),
                "end_time": (now + duration).timestamp_millis(),
                "updated_at": now.timestamp_millis(),
            }
        }
    }

    /// Update clearing any reservation and moving the machine to `status`.
    pub fn reset(status: MachineStatus, now: DateTime<Utc>) -> Document {
        doc! {
            "$set": {
                "status": status,
                "current_user_id": Bson::Null,
                "current_user_name": Bson::Null,
                "start_time": Bson::Null,
                "end_time": Bson::Null,
                "updated_at": now.timestamp_millis(),
            }
        }
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl LaundryMachine {
        pub fn example() -> Self {
            Self::new(NewMachineRequest::example())
        }

        pub fn example_in_use(user: &User, end_time: DateTime<Utc>) -> Self {
            Self {
                status: MachineStatus::InUse,
                current_user_id: Some(user.id.clone()),
                current_user_name: Some(user.name.clone()),
                start_time: Some(end_time - Duration::minutes(45)),
                end_time: Some(end_time),
                ..Self::example()
            }
        }
    }
}
