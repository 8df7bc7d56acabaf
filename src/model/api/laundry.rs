use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::db::laundry::MachineStatus,
};

/// Longest reservation a user may make, in minutes.
pub const MAX_RESERVATION_MINUTES: u32 = 240;

fn default_machine_kind() -> String {
    "Washing Machine".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMachineRequest {
    pub block: String,
    pub floor: String,
    pub machine_number: String,
    #[serde(rename = "type", default = "default_machine_kind")]
    pub kind: String,
}

impl NewMachineRequest {
    pub fn validate(&self) -> Result<()> {
        if [&self.block, &self.floor, &self.machine_number]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(Error::invalid("Block, floor and machine number are required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseMachineRequest {
    pub duration_minutes: u32,
}

impl UseMachineRequest {
    pub fn validate(&self) -> Result<()> {
        if (1..=MAX_RESERVATION_MINUTES).contains(&self.duration_minutes) {
            Ok(())
        } else {
            Err(Error::invalid(format!(
                "Duration must be between 1 and {MAX_RESERVATION_MINUTES} minutes"
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineStatusRequest {
    pub status: MachineStatus,
}

impl MachineStatusRequest {
    /// Machines only enter use through a reservation.
    pub fn validate(&self) -> Result<()> {
        if self.status == MachineStatus::InUse {
            return Err(Error::invalid("Machines are put in use by reserving them"));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_bounds() {
        let request = |duration_minutes| UseMachineRequest { duration_minutes };
        assert!(request(0).validate().is_err());
        assert!(request(1).validate().is_ok());
        assert!(request(MAX_RESERVATION_MINUTES).validate().is_ok());
        assert!(request(MAX_RESERVATION_MINUTES + 1).validate().is_err());
    }

    #[test]
    fn kind_defaults_to_washer() {
        let request: NewMachineRequest =
            serde_json::from_str(r#"{"block":"1","floor":"G","machine_number":"3"}"#).unwrap();
        assert_eq!(request.kind, "Washing Machine");
    }

    #[test]
    fn status_change_cannot_reserve() {
        let in_use = MachineStatusRequest {
            status: MachineStatus::InUse,
        };
        assert!(in_use.validate().is_err());
        let maintenance = MachineStatusRequest {
            status: MachineStatus::Maintenance,
        };
        assert!(maintenance.validate().is_ok());
    }
}
