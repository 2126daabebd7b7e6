//! Unvalidated routine input and its conversion into a [`Routine`].
//!
//! Submitted routines arrive with stringly-typed days and times. They are
//! parsed once here; everything past this boundary works on typed values.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::routine::{DaySchedule, Period, Routine, Weekday};
use super::time::TimeOfDay;

/// Period as submitted by a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodDraft {
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub teacher: Option<String>,
    pub room_no: Option<String>,
}

/// Day entry as submitted by a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DayScheduleDraft {
    pub day: String,
    pub periods: Vec<PeriodDraft>,
}

/// Routine as submitted by a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoutineDraft {
    pub class_name: String,
    pub section: String,
    pub week_schedule: Vec<DayScheduleDraft>,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// JSON path of the offending field, e.g. `weekSchedule[0].periods[2].startTime`.
    pub field: String,
    pub message: String,
}

/// The submitted routine is malformed. Raised before any conflict scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .issues
            .iter()
            .map(|i| format!("{}: {}", i.field, i.message))
            .collect();
        write!(f, "Invalid routine: {}", parts.join("; "))
    }
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![FieldIssue {
                field: field.into(),
                message: message.into(),
            }],
        }
    }
}

#[derive(Default)]
struct Issues(Vec<FieldIssue>);

impl Issues {
    fn push(&mut self, field: String, message: impl Into<String>) {
        self.0.push(FieldIssue {
            field,
            message: message.into(),
        });
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RoutineDraft {
    /// Validate and convert into a typed [`Routine`].
    ///
    /// Every problem is collected so the caller sees all of them at once.
    pub fn validate(self) -> Result<Routine, ValidationError> {
        let mut issues = Issues::default();

        let class_name = self.class_name.trim().to_string();
        let section = self.section.trim().to_string();
        if class_name.is_empty() {
            issues.push("className".to_string(), "must not be empty");
        }
        if section.is_empty() {
            issues.push("section".to_string(), "must not be empty");
        }
        if self.week_schedule.is_empty() {
            issues.push("weekSchedule".to_string(), "must contain at least one day");
        }

        let mut seen_days = HashSet::new();
        let mut week_schedule = Vec::with_capacity(self.week_schedule.len());

        for (day_idx, day_draft) in self.week_schedule.into_iter().enumerate() {
            let day_path = format!("weekSchedule[{}]", day_idx);
            let day = match day_draft.day.parse::<Weekday>() {
                Ok(day) => {
                    if !seen_days.insert(day) {
                        issues.push(
                            format!("{}.day", day_path),
                            format!("{} is listed twice", day),
                        );
                    }
                    Some(day)
                }
                Err(e) => {
                    issues.push(format!("{}.day", day_path), e);
                    None
                }
            };

            let mut periods = Vec::with_capacity(day_draft.periods.len());
            for (p_idx, p) in day_draft.periods.into_iter().enumerate() {
                let path = format!("{}.periods[{}]", day_path, p_idx);
                if let Some(period) = validate_period(p, &path, &mut issues) {
                    periods.push(period);
                }
            }

            if let Some(day) = day {
                week_schedule.push(DaySchedule { day, periods });
            }
        }

        if !issues.0.is_empty() {
            return Err(ValidationError { issues: issues.0 });
        }

        Ok(Routine {
            class_name,
            section,
            week_schedule,
        })
    }
}

fn parse_time(raw: &str, field: String, issues: &mut Issues) -> Option<TimeOfDay> {
    match raw.parse::<TimeOfDay>() {
        Ok(t) => Some(t),
        Err(e) => {
            issues.push(field, e.to_string());
            None
        }
    }
}

fn validate_period(p: PeriodDraft, path: &str, issues: &mut Issues) -> Option<Period> {
    let start = parse_time(&p.start_time, format!("{}.startTime", path), issues);
    let end = parse_time(&p.end_time, format!("{}.endTime", path), issues);
    let subject = p.subject.trim().to_string();
    if subject.is_empty() {
        issues.push(format!("{}.subject", path), "must not be empty");
    }

    let (start_time, end_time) = (start?, end?);
    let period = Period {
        start_time,
        end_time,
        subject,
        teacher: non_blank(p.teacher),
        room_no: non_blank(p.room_no),
    };

    // Applies to Tiffin breaks too.
    if period.end_time <= period.start_time {
        issues.push(
            format!("{}.endTime", path),
            format!("must be after startTime ({})", period.start_time),
        );
        return None;
    }

    Some(period)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_period(start: &str, end: &str, teacher: Option<&str>) -> PeriodDraft {
        PeriodDraft {
            start_time: start.to_string(),
            end_time: end.to_string(),
            subject: "Mathematics".to_string(),
            teacher: teacher.map(str::to_string),
            room_no: None,
        }
    }

    fn draft(periods: Vec<PeriodDraft>) -> RoutineDraft {
        RoutineDraft {
            class_name: "VI".to_string(),
            section: "A".to_string(),
            week_schedule: vec![DayScheduleDraft {
                day: "Monday".to_string(),
                periods,
            }],
        }
    }

    #[test]
    fn test_valid_draft_converts() {
        let routine = draft(vec![draft_period("10:00", "10:45", Some("Mr. Roy"))])
            .validate()
            .unwrap();
        assert_eq!(routine.class_name, "VI");
        assert_eq!(routine.week_schedule[0].day, Weekday::Monday);
        assert_eq!(routine.week_schedule[0].periods[0].start_time.minutes(), 600);
    }

    #[test]
    fn test_malformed_time_is_rejected() {
        let err = draft(vec![draft_period("bad", "10:45", Some("Mr. Roy"))])
            .validate()
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].field, "weekSchedule[0].periods[0].startTime");
    }

    #[test]
    fn test_missing_key_and_empty_week() {
        let err = RoutineDraft::default().validate().unwrap_err();
        let fields: Vec<&str> = err.issues.iter().map(|i| i.field.as_str()).collect();
        assert_eq!(fields, vec!["className", "section", "weekSchedule"]);
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = draft(vec![draft_period("11:00", "10:00", None)])
            .validate()
            .unwrap_err();
        assert!(err.issues[0].message.contains("after startTime"));
    }

    #[test]
    fn test_inverted_tiffin_rejected() {
        let mut tiffin = draft_period("12:00", "11:30", None);
        tiffin.subject = "Tiffin".to_string();
        let err = draft(vec![draft_period("10:00", "10:45", Some("Mr. Roy")), tiffin])
            .validate()
            .unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert_eq!(err.issues[0].field, "weekSchedule[0].periods[1].endTime");
    }

    #[test]
    fn test_duplicate_and_unknown_days() {
        let mut d = draft(vec![]);
        d.week_schedule.push(DayScheduleDraft {
            day: "Monday".to_string(),
            periods: vec![],
        });
        d.week_schedule.push(DayScheduleDraft {
            day: "Sunday".to_string(),
            periods: vec![],
        });
        let err = d.validate().unwrap_err();
        assert_eq!(err.issues.len(), 2);
        assert!(err.issues[0].message.contains("listed twice"));
        assert!(err.issues[1].message.contains("Unknown school day"));
    }

    #[test]
    fn test_blank_teacher_becomes_none() {
        let routine = draft(vec![draft_period("10:00", "10:45", Some("  "))])
            .validate()
            .unwrap();
        assert_eq!(routine.week_schedule[0].periods[0].teacher, None);
    }
}
