//! Tests for the in-memory routine repository.

mod support;

use routine_rust::api::{RoutineId, RoutineKey};
use routine_rust::db::repositories::LocalRepository;
use routine_rust::db::repository::{RoutineRepository, SaveOutcome};
use routine_rust::models::Routine;
use routine_rust::services::TeacherMatching;

use support::single_period;

fn routine(class_name: &str, section: &str, start: &str, end: &str, teacher: &str) -> Routine {
    single_period(class_name, section, "Monday", start, end, teacher)
        .validate()
        .unwrap()
}

#[tokio::test]
async fn test_list_routines_is_ordered_by_key() {
    let repo = LocalRepository::new();
    for (class_name, section) in [("VII", "B"), ("VI", "B"), ("VI", "A")] {
        repo.upsert_routine(&routine(class_name, section, "08:00", "08:45", "Ms. Sen"))
            .await
            .unwrap();
    }

    let keys: Vec<String> = repo
        .list_routines()
        .await
        .unwrap()
        .iter()
        .map(|r| r.routine.key().to_string())
        .collect();
    assert_eq!(keys, vec!["VI-A", "VI-B", "VII-B"]);
}

#[tokio::test]
async fn test_ids_are_stable_across_replacements() {
    let repo = LocalRepository::new();
    let a = repo
        .upsert_routine(&routine("VI", "A", "08:00", "08:45", "Ms. Sen"))
        .await
        .unwrap();
    let b = repo
        .upsert_routine(&routine("VI", "B", "08:00", "08:45", "Mr. Roy"))
        .await
        .unwrap();
    let a_again = repo
        .upsert_routine(&routine("VI", "A", "09:00", "09:45", "Ms. Sen"))
        .await
        .unwrap();

    assert_eq!(a.routine.id, RoutineId::new(1));
    assert_eq!(b.routine.id, RoutineId::new(2));
    assert_eq!(a_again.routine.id, RoutineId::new(1));
    assert_ne!(a.routine.checksum, a_again.routine.checksum);
}

#[tokio::test]
async fn test_get_and_delete_round_trip() {
    let repo = LocalRepository::new();
    let key = RoutineKey::new("IX", "C");
    repo.upsert_routine(&routine("IX", "C", "08:00", "08:45", "Ms. Sen"))
        .await
        .unwrap();

    let fetched = repo.get_routine(&key).await.unwrap();
    assert_eq!(fetched.routine.class_name, "IX");

    let deleted = repo.delete_routine(&key).await.unwrap();
    assert_eq!(deleted.id, fetched.id);
    assert!(repo.get_routine(&key).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_clear_keeps_health_state() {
    let repo = LocalRepository::new();
    repo.upsert_routine(&routine("VI", "A", "08:00", "08:45", "Ms. Sen"))
        .await
        .unwrap();
    repo.clear();
    assert_eq!(repo.routine_count(), 0);
    assert!(repo.health_check().await.unwrap());

    let saved = repo
        .upsert_routine(&routine("VI", "A", "08:00", "08:45", "Ms. Sen"))
        .await
        .unwrap();
    assert_eq!(saved.routine.id, RoutineId::new(1));
}

#[tokio::test]
async fn test_unhealthy_repository_rejects_checked_save() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);

    let err = repo
        .save_routine_checked(
            &routine("VI", "A", "08:00", "08:45", "Ms. Sen"),
            TeacherMatching::Exact,
        )
        .await
        .unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(repo.routine_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_checked_saves_admit_one_booking() {
    let repo = LocalRepository::new();

    let handles: Vec<_> = ["A", "B", "C", "D", "E", "F", "G", "H"]
        .into_iter()
        .map(|section| {
            let repo = repo.clone();
            let candidate = routine("VII", section, "10:00", "10:45", "Mr. Roy");
            tokio::spawn(async move {
                repo.save_routine_checked(&candidate, TeacherMatching::Exact)
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut saved = 0;
    let mut rejected = 0;
    for handle in handles {
        match handle.await.unwrap() {
            SaveOutcome::Saved(_) => saved += 1,
            SaveOutcome::Rejected(conflict) => {
                assert_eq!(conflict.teacher, "Mr. Roy");
                rejected += 1;
            }
        }
    }

    assert_eq!(saved, 1);
    assert_eq!(rejected, 7);
    assert_eq!(repo.routine_count(), 1);
}
