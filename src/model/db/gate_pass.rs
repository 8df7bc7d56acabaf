use chrono::{serde::ts_milliseconds, DateTime, Utc};
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::gate_pass::NewGatePassRequest,
    common::{bson_enum, location::UNKNOWN},
    db::user::User,
    mongodb::Id,
};

/// Rejection reason recorded when the manager gives none.
pub const DEFAULT_REJECTION_REASON: &str = "No reason provided";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PassType {
    Outing,
    #[serde(rename = "Home Visit")]
    HomeVisit,
    Emergency,
    Vacation,
}

impl PassType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outing => "Outing",
            Self::HomeVisit => "Home Visit",
            Self::Emergency => "Emergency",
            Self::Vacation => "Vacation",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, FromFormField)]
pub enum PassStatus {
    Pending,
    Approved,
    Rejected,
    Used,
    Expired,
}

impl PassStatus {
    /// Statuses that block a student from requesting another pass.
    pub const ACTIVE: [PassStatus; 2] = [Self::Pending, Self::Approved];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Used => "Used",
            Self::Expired => "Expired",
        }
    }
}

bson_enum!(PassType, PassStatus);

/// A student's request to leave the hostel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatePass {
    pub id: Id,
    pub student_id: Id,
    pub student_name: String,
    pub hostel: String,
    pub room: String,
    #[serde(rename = "type")]
    pub kind: PassType,
    pub reason: String,
    pub destination: String,
    #[serde(with = "ts_milliseconds")]
    pub depart_time: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub return_time: DateTime<Utc>,
    pub contact_number: String,
    pub status: PassStatus,
    pub approved_by: Option<Id>,
    pub approved_by_name: Option<String>,
    pub rejection_reason: Option<String>,
    pub qr_code: String,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl GatePass {
    pub fn new(student: &User, request: NewGatePassRequest) -> Self {
        let now = Utc::now();
        let id = Id::new();
        Self {
            qr_code: format!("GATEPASS:{id}"),
            id,
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            hostel: student.hostel.clone().unwrap_or_else(|| UNKNOWN.to_string()),
            room: format!(
                "{}-{}",
                student.block.as_deref().unwrap_or_default(),
                student.room.as_deref().unwrap_or_default()
            ),
            kind: request.kind,
            reason: request.reason,
            destination: request.destination,
            depart_time: request.depart_time,
            return_time: request.return_time,
            contact_number: request.contact_number,
            status: PassStatus::Pending,
            approved_by: None,
            approved_by_name: None,
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Filter for passes that block `student` from requesting another.
    pub fn active_filter(student: &Id) -> Document {
        doc! {
            "student_id": student,
            "status": { "$in": PassStatus::ACTIVE.to_vec() },
        }
    }

    /// Update applying a manager's decision.
    pub fn status_update(
        status: PassStatus,
        reason: Option<String>,
        actor: &User,
        now: DateTime<Utc>,
    ) -> Document {
        let mut set = doc! {
            "status": status,
            "updated_at": now.timestamp_millis(),
        };
        if matches!(status, PassStatus::Approved | PassStatus::Rejected) {
            set.insert("approved_by", &actor.id);
            set.insert("approved_by_name", actor.name.clone());
        }
        if status == PassStatus::Rejected {
            set.insert(
                "rejection_reason",
                reason.unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string()),
            );
            doc! { "$set": set }
        } else {
            doc! { "$set": set, "$unset": { "rejection_reason": "" } }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pass_fields() {
        let student = User::example_student();
        let pass = GatePass::new(&student, NewGatePassRequest::example());
        assert_eq!(pass.status, PassStatus::Pending);
        assert_eq!(pass.room, "2-205");
        assert_eq!(pass.hostel, "A");
        assert_eq!(pass.qr_code, format!("GATEPASS:{}", pass.id));
    }

    #[test]
    fn later_decisions_clear_rejection_reason() {
        let manager = User::example_manager();
        let update = GatePass::status_update(
            PassStatus::Approved,
            Some("ignored".to_string()),
            &manager,
            Utc::now(),
        );
        let set = update.get_document("$set").unwrap();
        assert!(!set.contains_key("rejection_reason"));
        assert!(update.get_document("$unset").unwrap().contains_key("rejection_reason"));
    }

    #[test]
    fn rejection_defaults_reason() {
        let manager = User::example_manager();
        let update = GatePass::status_update(PassStatus::Rejected, None, &manager, Utc::now());
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("rejection_reason"), Ok(DEFAULT_REJECTION_REASON));
        assert_eq!(set.get_str("approved_by"), Ok(manager.id.as_str()));
    }

    #[test]
    fn approval_records_actor() {
        let manager = User::example_manager();
        let update = GatePass::status_update(
            PassStatus::Approved,
            Some("ignored".to_string()),
            &manager,
            Utc::now(),
        );
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("approved_by_name"), Ok(manager.name.as_str()));
        assert!(set.get("rejection_reason").is_none());
    }

    #[test]
    fn operator_statuses_skip_actor() {
        let update =
            GatePass::status_update(PassStatus::Used, None, &User::example_manager(), Utc::now());
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("status"), Ok("Used"));
        assert!(set.get("approved_by").is_none());
    }
}
