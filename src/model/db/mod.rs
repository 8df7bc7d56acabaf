//! DB-compatible (e.g. de/serialisable) types.
//!
//! The types in this module are serialised in a DB-friendly way, e.g.:
//!
//! - IDs are strings in an `id` field, never MongoDB's `_id`.
//! - Datetimes are integer milliseconds since the Unix epoch.
//! - Enums are their string labels.
//!
//! Most of them double as response bodies.

pub mod announcement;
pub mod attendance;
pub mod conversation;
pub mod gate_pass;
pub mod issue;
pub mod laundry;
pub mod listing;
pub mod lost_found;
pub mod mess_menu;
pub mod notification;
pub mod poll;
pub mod user;
