//! # Routine Rust Backend
//!
//! Weekly class routines for a school, with teacher double-booking
//! detection.
//!
//! A routine is the weekly timetable of one class section. Before a
//! routine is stored it is checked against every other stored routine: no
//! teacher may be assigned to two class sections during overlapping
//! periods on the same day. Tiffin breaks are exempt.
//!
//! ## Architecture
//!
//! - [`api`]: Identifiers and re-exported public types
//! - [`models`]: Time values, routines and unvalidated drafts
//! - [`services`]: Conflict detection, availability preview, save orchestration
//! - [`db`]: Repository trait, in-memory and Postgres backends
//! - [`config`]: Server configuration
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Example
//!
//! ```
//! use routine_rust::models::RoutineDraft;
//! use routine_rust::services::{check_routine, TeacherMatching};
//!
//! let draft: RoutineDraft = serde_json::from_str(r#"{
//!     "className": "VI", "section": "A",
//!     "weekSchedule": [{"day": "Monday", "periods": [
//!         {"startTime": "10:00", "endTime": "10:45", "subject": "Maths", "teacher": "Mr. Roy"}
//!     ]}]
//! }"#).unwrap();
//! let routine = draft.validate().unwrap();
//! let others: Vec<routine_rust::models::Routine> = Vec::new();
//! assert!(check_routine(&routine, &others, TeacherMatching::Exact).is_ok());
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
