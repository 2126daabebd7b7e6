#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;

use routine_rust::models::{DayScheduleDraft, PeriodDraft, RoutineDraft};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to the process-global
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Writes `contents` to a per-process temp file and returns its path.
pub fn write_temp_config(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("routine-rust-tests-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A teaching period draft.
pub fn period(start: &str, end: &str, subject: &str, teacher: &str) -> PeriodDraft {
    PeriodDraft {
        start_time: start.to_string(),
        end_time: end.to_string(),
        subject: subject.to_string(),
        teacher: Some(teacher.to_string()),
        room_no: None,
    }
}

/// A Tiffin break draft with no teacher.
pub fn tiffin(start: &str, end: &str) -> PeriodDraft {
    PeriodDraft {
        start_time: start.to_string(),
        end_time: end.to_string(),
        subject: "Tiffin".to_string(),
        teacher: None,
        room_no: None,
    }
}

/// A routine draft with the given `(day, periods)` entries.
pub fn routine(
    class_name: &str,
    section: &str,
    days: Vec<(&str, Vec<PeriodDraft>)>,
) -> RoutineDraft {
    RoutineDraft {
        class_name: class_name.to_string(),
        section: section.to_string(),
        week_schedule: days
            .into_iter()
            .map(|(day, periods)| DayScheduleDraft {
                day: day.to_string(),
                periods,
            })
            .collect(),
    }
}

/// A routine draft with a single period on `day`.
pub fn single_period(
    class_name: &str,
    section: &str,
    day: &str,
    start: &str,
    end: &str,
    teacher: &str,
) -> RoutineDraft {
    routine(
        class_name,
        section,
        vec![(day, vec![period(start, end, "Mathematics", teacher)])],
    )
}
