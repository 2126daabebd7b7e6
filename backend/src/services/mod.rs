//! Service layer for business logic and orchestration.
//!
//! Services sit between the HTTP handlers and the repository. The conflict
//! and availability scans are pure functions over routines; `routines`
//! wires them to storage.

pub mod availability;
pub mod conflicts;
pub mod routines;

pub use availability::{busy_teachers, is_teacher_available, BusyTeacher};
pub use conflicts::{
    check_routine, check_routine_report, find_conflicts, ConflictError, TeacherMatching,
};
pub use routines::{
    check_routine_draft, delete_routine, get_routine, health_check, list_routines, save_routine,
    teacher_availability, AvailabilityQuery, AvailabilityReport, RoutineError,
};
