//! Teacher double-booking detection across class routines.
//!
//! A candidate routine conflicts with a stored routine of a *different*
//! class section when the same teacher teaches in both on the same weekday
//! and the two periods overlap as half-open intervals `[start, end)`.
//! Tiffin breaks and periods without a teacher never take part.
//!
//! The scan is lazy: [`find_conflicts`] yields conflicts one by one in
//! candidate order, so [`check_routine`] stops at the first one while
//! [`check_routine_report`] collects all of them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::routine::{Period, Routine, StoredRoutine, Weekday};
use crate::models::time::TimeOfDay;

/// How teacher names are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeacherMatching {
    /// Case-sensitive string equality.
    #[default]
    Exact,
    /// Equality after trimming and lower-casing both names.
    Normalized,
}

impl TeacherMatching {
    pub fn same_teacher(&self, a: &str, b: &str) -> bool {
        match self {
            TeacherMatching::Exact => a == b,
            TeacherMatching::Normalized => a.trim().to_lowercase() == b.trim().to_lowercase(),
        }
    }
}

impl FromStr for TeacherMatching {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" | "case_sensitive" => Ok(Self::Exact),
            "normalized" | "case_insensitive" => Ok(Self::Normalized),
            _ => Err(format!("Unknown teacher matching mode: {}", s)),
        }
    }
}

/// A teacher would be in two class sections at once.
///
/// `other_*` fields describe the already stored period; `start`/`end` are
/// the candidate period that collided with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error(
    "Conflict Detected: {teacher} is already assigned to Class {other_class_name}-{other_section} on {day} ({other_start} - {other_end})"
)]
pub struct ConflictError {
    pub teacher: String,
    pub day: Weekday,
    pub other_class_name: String,
    pub other_section: String,
    pub other_start: TimeOfDay,
    pub other_end: TimeOfDay,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl AsRef<Routine> for Routine {
    fn as_ref(&self) -> &Routine {
        self
    }
}

impl AsRef<Routine> for StoredRoutine {
    fn as_ref(&self) -> &Routine {
        &self.routine
    }
}

fn same_section(a: &Routine, b: &Routine) -> bool {
    a.class_name == b.class_name && a.section == b.section
}

fn collides(p: &Period, teacher: &str, q: &Period, matching: TeacherMatching) -> bool {
    match q.bookable_teacher() {
        Some(other) => matching.same_teacher(teacher, other) && p.range().overlaps(&q.range()),
        None => false,
    }
}

/// Lazily enumerate every conflict `candidate` has with `others`.
///
/// Routines in `others` sharing the candidate's (className, section) are
/// skipped: saving replaces them.
pub fn find_conflicts<'a, R>(
    candidate: &'a Routine,
    others: &'a [R],
    matching: TeacherMatching,
) -> impl Iterator<Item = ConflictError> + 'a
where
    R: AsRef<Routine>,
{
    candidate.week_schedule.iter().flat_map(move |day| {
        day.periods
            .iter()
            .filter_map(|p| p.bookable_teacher().map(|teacher| (p, teacher)))
            .flat_map(move |(p, teacher)| {
                others
                    .iter()
                    .map(AsRef::<Routine>::as_ref)
                    .filter(move |other| !same_section(candidate, other))
                    .filter_map(move |other| other.day(day.day).map(|d| (other, d)))
                    .flat_map(move |(other, other_day)| {
                        other_day
                            .periods
                            .iter()
                            .filter(move |q| collides(p, teacher, q, matching))
                            .map(move |q| ConflictError {
                                teacher: teacher.to_string(),
                                day: day.day,
                                other_class_name: other.class_name.clone(),
                                other_section: other.section.clone(),
                                other_start: q.start_time,
                                other_end: q.end_time,
                                start: p.start_time,
                                end: p.end_time,
                            })
                    })
            })
    })
}

/// Fail-fast check: the first conflict found, if any.
pub fn check_routine<R: AsRef<Routine>>(
    candidate: &Routine,
    others: &[R],
    matching: TeacherMatching,
) -> Result<(), ConflictError> {
    match find_conflicts(candidate, others, matching).next() {
        Some(conflict) => Err(conflict),
        None => Ok(()),
    }
}

/// Every conflict, in scan order.
pub fn check_routine_report<R: AsRef<Routine>>(
    candidate: &Routine,
    others: &[R],
    matching: TeacherMatching,
) -> Vec<ConflictError> {
    find_conflicts(candidate, others, matching).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::routine::DaySchedule;

    fn period(start: &str, end: &str, subject: &str, teacher: Option<&str>) -> Period {
        Period {
            start_time: start.parse().unwrap(),
            end_time: end.parse().unwrap(),
            subject: subject.to_string(),
            teacher: teacher.map(str::to_string),
            room_no: None,
        }
    }

    fn routine(class_name: &str, section: &str, day: Weekday, periods: Vec<Period>) -> Routine {
        Routine {
            class_name: class_name.to_string(),
            section: section.to_string(),
            week_schedule: vec![DaySchedule { day, periods }],
        }
    }

    /// A routine with a single Monday period.
    fn monday(
        class_name: &str,
        section: &str,
        slot: (&str, &str),
        subject: &str,
        teacher: &str,
    ) -> Routine {
        let (start, end) = slot;
        let periods = vec![period(start, end, subject, Some(teacher))];
        routine(class_name, section, Weekday::Monday, periods)
    }

    #[test]
    fn test_overlap_same_teacher_same_day_conflicts() {
        let a = monday("VI", "A", ("10:00", "10:45"), "Maths", "Mr. Roy");
        let b = monday("VII", "B", ("10:30", "11:15"), "Maths", "Mr. Roy");

        let err = check_routine(&b, &[a], TeacherMatching::Exact).unwrap_err();
        assert_eq!(err.teacher, "Mr. Roy");
        assert_eq!(err.day, Weekday::Monday);
        assert_eq!(err.other_class_name, "VI");
        assert_eq!(err.other_section, "A");
        assert_eq!(err.other_start.to_string(), "10:00");
        assert_eq!(err.other_end.to_string(), "10:45");
        assert_eq!(
            err.to_string(),
            "Conflict Detected: Mr. Roy is already assigned to Class VI-A on Monday (10:00 - 10:45)"
        );
    }

    #[test]
    fn test_tiffin_on_either_side_is_exempt() {
        let a = monday("VI", "A", ("10:00", "10:45"), "Tiffin", "Mr. Roy");
        let b = monday("VII", "B", ("10:00", "10:45"), "Maths", "Mr. Roy");
        assert!(check_routine(&b, std::slice::from_ref(&a), TeacherMatching::Exact).is_ok());
        assert!(check_routine(&a, &[b], TeacherMatching::Exact).is_ok());
    }

    #[test]
    fn test_case_sensitivity_follows_matching_mode() {
        let a = monday("VI", "A", ("10:00", "10:45"), "Maths", "Mr. Roy");
        let b = monday("VII", "B", ("10:15", "10:30"), "Maths", " mr. roy");
        let others = [a];
        assert!(check_routine(&b, &others, TeacherMatching::Exact).is_ok());
        assert!(check_routine(&b, &others, TeacherMatching::Normalized).is_err());
    }

    #[test]
    fn test_same_section_in_others_is_ignored() {
        let stored = monday("VI", "A", ("10:00", "10:45"), "Maths", "Mr. Roy");
        let resubmitted = stored.clone();
        assert!(check_routine(&resubmitted, &[stored], TeacherMatching::Exact).is_ok());
    }

    #[test]
    fn test_report_lists_every_conflict_in_order() {
        let a = routine(
            "VI",
            "A",
            Weekday::Monday,
            vec![
                period("09:00", "09:45", "Maths", Some("Mr. Roy")),
                period("10:00", "10:45", "Science", Some("Ms. Sen")),
            ],
        );
        let b = routine(
            "VII",
            "B",
            Weekday::Monday,
            vec![
                period("09:30", "10:15", "Maths", Some("Mr. Roy")),
                period("10:30", "11:00", "Science", Some("Ms. Sen")),
            ],
        );
        let report = check_routine_report(&b, &[a], TeacherMatching::Exact);
        let teachers: Vec<&str> = report.iter().map(|c| c.teacher.as_str()).collect();
        assert_eq!(teachers, vec!["Mr. Roy", "Ms. Sen"]);
        assert_eq!(report[1].start.to_string(), "10:30");
    }

    #[test]
    fn test_teacher_matching_from_str() {
        assert_eq!("exact".parse::<TeacherMatching>().unwrap(), TeacherMatching::Exact);
        assert_eq!(
            "Normalized".parse::<TeacherMatching>().unwrap(),
            TeacherMatching::Normalized
        );
        assert!("fuzzy".parse::<TeacherMatching>().is_err());
    }
}
