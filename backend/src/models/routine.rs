//! Weekly routine (timetable) domain types.
//!
//! A [`Routine`] is the full weekly timetable of one class section. It is
//! always created or replaced as a whole; there are no per-period updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::time::{TimeOfDay, TimeRange};
use crate::api::{RoutineId, RoutineKey};

/// Subject name marking a break. Break periods carry no teacher.
pub const TIFFIN_SUBJECT: &str = "Tiffin";

/// School weekday. Sunday is not a school day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const ALL: [Weekday; 6] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
        }
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown school day: {}", s))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled lesson or break slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_no: Option<String>,
}

impl Period {
    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.start_time, self.end_time)
    }

    /// True for the Tiffin break sentinel.
    pub fn is_break(&self) -> bool {
        self.subject == TIFFIN_SUBJECT
    }

    /// Teacher subject to double-booking checks, if any.
    ///
    /// Breaks and blank teacher fields yield `None`.
    pub fn bookable_teacher(&self) -> Option<&str> {
        if self.is_break() {
            return None;
        }
        self.teacher
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }
}

/// One weekday's periods, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: Weekday,
    #[serde(default)]
    pub periods: Vec<Period>,
}

/// Weekly timetable of one class section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Routine {
    pub class_name: String,
    pub section: String,
    pub week_schedule: Vec<DaySchedule>,
}

impl Routine {
    pub fn key(&self) -> RoutineKey {
        RoutineKey::new(self.class_name.clone(), self.section.clone())
    }

    /// Day entry for `day`; `None` when the routine has no entry for it.
    pub fn day(&self, day: Weekday) -> Option<&DaySchedule> {
        self.week_schedule.iter().find(|entry| entry.day == day)
    }

    /// Total number of periods across the week.
    pub fn period_count(&self) -> usize {
        self.week_schedule.iter().map(|d| d.periods.len()).sum()
    }
}

/// A routine as persisted, with its storage-assigned metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRoutine {
    pub id: RoutineId,
    #[serde(flatten)]
    pub routine: Routine,
    /// SHA-256 of the canonical weekly schedule JSON.
    pub checksum: String,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(subject: &str, teacher: Option<&str>) -> Period {
        Period {
            start_time: "10:00".parse().unwrap(),
            end_time: "10:45".parse().unwrap(),
            subject: subject.to_string(),
            teacher: teacher.map(str::to_string),
            room_no: None,
        }
    }

    #[test]
    fn test_weekday_parse() {
        assert_eq!("Monday".parse::<Weekday>().unwrap(), Weekday::Monday);
        assert_eq!(" saturday ".parse::<Weekday>().unwrap(), Weekday::Saturday);
        assert!("Sunday".parse::<Weekday>().is_err());
    }

    #[test]
    fn test_tiffin_has_no_bookable_teacher() {
        assert_eq!(period("Tiffin", Some("Mr. Roy")).bookable_teacher(), None);
        assert_eq!(period("Mathematics", Some("   ")).bookable_teacher(), None);
        assert_eq!(period("Mathematics", None).bookable_teacher(), None);
        assert_eq!(
            period("Mathematics", Some("Mr. Roy")).bookable_teacher(),
            Some("Mr. Roy")
        );
    }

    #[test]
    fn test_routine_json_shape() {
        let routine = Routine {
            class_name: "VI".to_string(),
            section: "A".to_string(),
            week_schedule: vec![DaySchedule {
                day: Weekday::Monday,
                periods: vec![period("Mathematics", Some("Mr. Roy"))],
            }],
        };
        let value = serde_json::to_value(&routine).unwrap();
        assert_eq!(value["className"], "VI");
        assert_eq!(value["weekSchedule"][0]["day"], "Monday");
        assert_eq!(value["weekSchedule"][0]["periods"][0]["startTime"], "10:00");
        assert!(value["weekSchedule"][0]["periods"][0].get("roomNo").is_none());
    }
}
