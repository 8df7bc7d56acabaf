use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{
        api::{issue::check_length, phone::Phone},
        db::gate_pass::{PassStatus, PassType},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGatePassRequest {
    #[serde(rename = "type")]
    pub kind: PassType,
    pub reason: String,
    pub destination: String,
    #[serde(with = "ts_milliseconds")]
    pub depart_time: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub return_time: DateTime<Utc>,
    pub contact_number: String,
}

impl NewGatePassRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("Reason", &self.reason, 1, 500)?;
        check_length("Destination", &self.destination, 1, 200)?;
        if self.return_time <= self.depart_time {
            return Err(Error::invalid("Return time must be after departure time"));
        }
        self.contact_number
            .parse::<Phone>()
            .map_err(|err| Error::invalid(err.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassStatusRequest {
    pub status: PassStatus,
    pub reason: Option<String>,
}


#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn return_must_follow_departure() {
        assert!(NewGatePassRequest::example().validate().is_ok());
        let request = NewGatePassRequest::example();
        let backwards = NewGatePassRequest {
            return_time: request.depart_time - Duration::hours(1),
            ..request.clone()
        };
        assert!(backwards.validate().is_err());
        let same = NewGatePassRequest {
            return_time: request.depart_time,
            ..request
        };
        assert!(same.validate().is_err());
    }

    #[test]
    fn contact_number_must_be_a_phone() {
        let request = NewGatePassRequest {
            contact_number: "call the warden".to_string(),
            ..NewGatePassRequest::example()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn pass_type_labels() {
        let request: NewGatePassRequest = serde_json::from_str(
            r#"{"type":"Home Visit","reason":"r","destination":"d","depart_time":1000,"return_time":2000,"contact_number":"9876543210"}"#,
        )
        .unwrap();
        assert_eq!(request.kind, PassType::HomeVisit);
        assert_eq!(request.return_time.timestamp_millis(), 2000);
    }
}
