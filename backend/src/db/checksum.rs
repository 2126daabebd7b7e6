//! Content fingerprints for stored routines.

use sha2::{Digest, Sha256};

use crate::models::routine::Routine;

/// Calculate the SHA-256 checksum of `content`, hex encoded.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fingerprint of a routine's weekly schedule.
///
/// Two routines with the same days, periods and period order share a
/// checksum regardless of which class section they belong to.
pub fn routine_checksum(routine: &Routine) -> String {
    let canonical = serde_json::to_string(&routine.week_schedule).unwrap_or_default();
    calculate_checksum(&canonical)
}
