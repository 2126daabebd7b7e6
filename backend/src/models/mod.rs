pub mod draft;
pub mod routine;
pub mod time;

pub use draft::{DayScheduleDraft, FieldIssue, PeriodDraft, RoutineDraft, ValidationError};
pub use routine::{DaySchedule, Period, Routine, StoredRoutine, Weekday, TIFFIN_SUBJECT};
pub use time::{TimeOfDay, TimeParseError, TimeRange};
