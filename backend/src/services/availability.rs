//! Advisory teacher availability for a prospective slot.
//!
//! Used by the routine editor to mark teachers that are already busy before
//! a routine is submitted. The verdict is advisory only; the conflict check
//! at save time decides. Both share the overlap rule and the Tiffin
//! exemption of [`find_conflicts`](super::conflicts::find_conflicts).

use serde::{Deserialize, Serialize};

use super::conflicts::{check_routine, TeacherMatching};
use crate::api::RoutineKey;
use crate::models::routine::{DaySchedule, Period, Routine, Weekday};
use crate::models::time::{TimeOfDay, TimeRange};

/// A teacher already assigned somewhere during the queried slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusyTeacher {
    pub teacher: String,
    pub class_name: String,
    pub section: String,
    pub subject: String,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

/// Every teacher assignment in `others` overlapping `slot` on `day`.
///
/// The routine identified by `editing` is skipped, as it is the one being
/// edited. Results follow the order of `others`, then period order.
pub fn busy_teachers<R: AsRef<Routine>>(
    others: &[R],
    editing: &RoutineKey,
    day: Weekday,
    slot: TimeRange,
) -> Vec<BusyTeacher> {
    others
        .iter()
        .map(AsRef::<Routine>::as_ref)
        .filter(|r| r.class_name != editing.class_name || r.section != editing.section)
        .filter_map(|r| r.day(day).map(|d| (r, d)))
        .flat_map(|(r, d)| {
            d.periods.iter().filter_map(move |p| {
                let teacher = p.bookable_teacher()?;
                if !p.range().overlaps(&slot) {
                    return None;
                }
                Some(BusyTeacher {
                    teacher: teacher.to_string(),
                    class_name: r.class_name.clone(),
                    section: r.section.clone(),
                    subject: p.subject.clone(),
                    start_time: p.start_time,
                    end_time: p.end_time,
                })
            })
        })
        .collect()
}

/// Would assigning `teacher` to `slot` on `day` for `editing` pass the
/// save-time conflict check?
pub fn is_teacher_available<R: AsRef<Routine>>(
    others: &[R],
    editing: &RoutineKey,
    day: Weekday,
    slot: TimeRange,
    teacher: &str,
    matching: TeacherMatching,
) -> bool {
    let probe = Routine {
        class_name: editing.class_name.clone(),
        section: editing.section.clone(),
        week_schedule: vec![DaySchedule {
            day,
            periods: vec![Period {
                start_time: slot.start,
                end_time: slot.end,
                subject: String::new(),
                teacher: Some(teacher.to_string()),
                room_no: None,
            }],
        }],
    };
    check_routine(&probe, others, matching).is_ok()
}
