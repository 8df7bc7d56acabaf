use chrono::{serde::ts_milliseconds, DateTime, NaiveDate, Utc};
use mongodb::bson::{doc, Document};
use serde::{Deserialize, Serialize};

use crate::model::{
    api::attendance::MarkAttendanceRequest,
    common::{as_bson, bson_enum, location::UNKNOWN},
    db::user::User,
    mongodb::Id,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Leave,
}

bson_enum!(AttendanceStatus);

/// A student's attendance on one calendar day. There is at most one per
/// student per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attendance {
    pub id: Id,
    pub student_id: Id,
    pub student_name: String,
    pub hostel: String,
    pub block: String,
    pub room: String,
    /// Serialised as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
    pub marked_by: Id,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Attendance {
    /// Filter and upsert document recording `request` for `student`.
    ///
    /// The record's identity and student snapshot are only written when the
    /// day has no record yet.
    pub fn upsert(
        student: &User,
        request: &MarkAttendanceRequest,
        marker: &User,
        now: DateTime<Utc>,
    ) -> (Document, Document) {
        let filter = doc! {
            "student_id": &student.id,
            "date": as_bson(&request.date),
        };
        let part = |p: &Option<String>| p.clone().unwrap_or_else(|| UNKNOWN.to_string());
        let update = doc! {
            "$set": {
                "status": request.status,
                "remarks": request.remarks.clone(),
                "marked_by": &marker.id,
                "updated_at": now.timestamp_millis(),
            },
            "$setOnInsert": {
                "id": Id::new(),
                "student_name": student.name.clone(),
                "hostel": part(&student.hostel),
                "block": part(&student.block),
                "room": part(&student.room),
                "created_at": now.timestamp_millis(),
            },
        };
        (filter, update)
    }
}

/// Attendance totals for one student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttendanceStats {
    pub present: u32,
    pub absent: u32,
    pub leave: u32,
    pub total: u32,
    pub attendance_percentage: f64,
}

impl AttendanceStats {
    pub fn from_statuses(statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        let mut stats = Self::default();
        for status in statuses {
            match status {
                AttendanceStatus::Present => stats.present += 1,
                AttendanceStatus::Absent => stats.absent += 1,
                AttendanceStatus::Leave => stats.leave += 1,
            }
            stats.total += 1;
        }
        if stats.total > 0 {
            let percentage = f64::from(stats.present) / f64::from(stats.total) * 100.0;
            stats.attendance_percentage = (percentage * 10.0).round() / 10.0;
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stats_round_to_one_decimal() {
        use AttendanceStatus::*;
        let stats = AttendanceStats::from_statuses([Present, Present, Absent]);
        assert_eq!(stats.present, 2);
        assert_eq!(stats.absent, 1);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.attendance_percentage, 66.7);
    }

    #[test]
    fn empty_stats() {
        let stats = AttendanceStats::from_statuses([]);
        assert_eq!(stats, AttendanceStats::default());
    }

    #[test]
    fn stats_wire_names() {
        let stats = AttendanceStats::from_statuses([AttendanceStatus::Leave]);
        assert_eq!(
            serde_json::to_value(&stats).unwrap(),
            json!({
                "Present": 0,
                "Absent": 0,
                "Leave": 1,
                "Total": 1,
                "AttendancePercentage": 0.0,
            })
        );
    }

    #[test]
    fn upsert_keys_on_student_and_day() {
        let student = User::example_student();
        let manager = User::example_manager();
        let request = MarkAttendanceRequest::example(&student.id);
        let (filter, update) = Attendance::upsert(&student, &request, &manager, Utc::now());
        assert_eq!(filter.get_str("student_id"), Ok(student.id.as_str()));
        assert_eq!(filter.get_str("date"), Ok("2024-03-09"));
        let insert = update.get_document("$setOnInsert").unwrap();
        assert_eq!(insert.get_str("room"), Ok("205"));
        assert!(update.get_document("$set").unwrap().contains_key("status"));
    }
}
