use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{db::attendance::AttendanceStatus, mongodb::Id};

/// Format of calendar days in requests, queries and storage.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkAttendanceRequest {
    pub student_id: Id,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
    pub remarks: Option<String>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_is_a_calendar_day() {
        let request: MarkAttendanceRequest = serde_json::from_str(
            r#"{"student_id":"s-1","status":"Leave","date":"2024-03-09"}"#,
        )
        .unwrap();
        assert_eq!(
            request.date,
            NaiveDate::parse_from_str("2024-03-09", DATE_FORMAT).unwrap()
        );
        assert_eq!(request.status, AttendanceStatus::Leave);
    }

    #[test]
    fn malformed_date_is_rejected() {
        let parsed = serde_json::from_str::<MarkAttendanceRequest>(
            r#"{"student_id":"s-1","status":"Present","date":"09/03/2024"}"#,
        );
        assert!(parsed.is_err());
    }
}
