//! Request and response bodies.
//!
//! Types in this module are what clients send and receive. Timestamps are
//! integer milliseconds, calendar days are `YYYY-MM-DD`, and enums use their
//! display labels.

pub mod ai;
pub mod analytics;
pub mod announcement;
pub mod attendance;
pub mod auth;
pub mod gate_pass;
pub mod issue;
pub mod laundry;
pub mod lost_found;
pub mod marketplace;
pub mod mess;
pub mod notification;
pub mod pagination;
pub mod phone;
pub mod rooms;
