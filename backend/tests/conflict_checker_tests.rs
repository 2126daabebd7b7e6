//! Save-time teacher conflict detection through the service layer.

mod support;

use routine_rust::api::RoutineKey;
use routine_rust::db::repositories::LocalRepository;
use routine_rust::models::Weekday;
use routine_rust::services::routines::{
    check_routine_draft, delete_routine, save_routine, RoutineError,
};
use routine_rust::services::TeacherMatching;

use support::{period, routine, single_period, tiffin};

async fn repo_with_vi_a() -> LocalRepository {
    let repo = LocalRepository::new();
    save_routine(
        &repo,
        single_period("VI", "A", "Monday", "10:00", "10:45", "Mr. Roy"),
        TeacherMatching::Exact,
    )
    .await
    .unwrap();
    repo
}

#[tokio::test]
async fn test_overlapping_period_is_rejected_with_details() {
    let repo = repo_with_vi_a().await;

    let err = save_routine(
        &repo,
        single_period("VII", "B", "Monday", "10:30", "11:15", "Mr. Roy"),
        TeacherMatching::Exact,
    )
    .await
    .unwrap_err();

    let conflict = match err {
        RoutineError::Conflict(conflict) => conflict,
        other => panic!("expected a conflict, got {other:?}"),
    };
    assert_eq!(conflict.teacher, "Mr. Roy");
    assert_eq!(conflict.day, Weekday::Monday);
    assert_eq!(conflict.other_class_name, "VI");
    assert_eq!(conflict.other_section, "A");
    assert_eq!(conflict.other_start.to_string(), "10:00");
    assert_eq!(conflict.other_end.to_string(), "10:45");
    assert_eq!(
        conflict.to_string(),
        "Conflict Detected: Mr. Roy is already assigned to Class VI-A on Monday (10:00 - 10:45)"
    );
    assert_eq!(repo.routine_count(), 1);
}

#[tokio::test]
async fn test_same_slot_on_another_day_is_accepted() {
    let repo = repo_with_vi_a().await;

    let saved = save_routine(
        &repo,
        single_period("VII", "B", "Tuesday", "10:30", "11:15", "Mr. Roy"),
        TeacherMatching::Exact,
    )
    .await
    .unwrap();

    assert!(saved.changed);
    assert_eq!(repo.routine_count(), 2);
}

#[tokio::test]
async fn test_adjacent_periods_do_not_conflict() {
    let repo = repo_with_vi_a().await;

    save_routine(
        &repo,
        single_period("VII", "B", "Monday", "10:45", "11:30", "Mr. Roy"),
        TeacherMatching::Exact,
    )
    .await
    .unwrap();
    save_routine(
        &repo,
        single_period("VIII", "C", "Monday", "09:15", "10:00", "Mr. Roy"),
        TeacherMatching::Exact,
    )
    .await
    .unwrap();

    assert_eq!(repo.routine_count(), 3);
}

#[tokio::test]
async fn test_overlap_in_any_direction_is_detected() {
    let repo = repo_with_vi_a().await;

    // Contained, containing, leading and trailing overlaps.
    for (start, end) in [
        ("10:10", "10:20"),
        ("09:00", "12:00"),
        ("09:30", "10:01"),
        ("10:44", "11:00"),
        ("10:00", "10:45"),
    ] {
        let result = save_routine(
            &repo,
            single_period("VII", "B", "Monday", start, end, "Mr. Roy"),
            TeacherMatching::Exact,
        )
        .await;
        assert!(
            matches!(result, Err(RoutineError::Conflict(_))),
            "{start}-{end} should conflict"
        );
    }
}

#[tokio::test]
async fn test_tiffin_is_exempt_on_both_sides() {
    let repo = LocalRepository::new();
    let mut with_break = routine("VI", "A", vec![("Monday", vec![tiffin("11:00", "11:30")])]);
    // A teacher on a Tiffin period is still ignored.
    with_break.week_schedule[0].periods[0].teacher = Some("Mr. Roy".to_string());
    save_routine(&repo, with_break, TeacherMatching::Exact)
        .await
        .unwrap();

    save_routine(
        &repo,
        single_period("VII", "B", "Monday", "11:00", "11:30", "Mr. Roy"),
        TeacherMatching::Exact,
    )
    .await
    .unwrap();

    let mut candidate = routine("VIII", "C", vec![("Monday", vec![tiffin("11:00", "11:30")])]);
    candidate.week_schedule[0].periods[0].teacher = Some("Mr. Roy".to_string());
    save_routine(&repo, candidate, TeacherMatching::Exact)
        .await
        .unwrap();

    assert_eq!(repo.routine_count(), 3);
}

#[tokio::test]
async fn test_resaving_own_routine_is_not_a_conflict() {
    let repo = repo_with_vi_a().await;

    let saved = save_routine(
        &repo,
        single_period("VI", "A", "Monday", "10:15", "11:00", "Mr. Roy"),
        TeacherMatching::Exact,
    )
    .await
    .unwrap();

    assert!(saved.changed);
    let stored_period = &saved.routine.routine.week_schedule[0].periods[0];
    assert_eq!(stored_period.start_time.to_string(), "10:15");
    assert_eq!(repo.routine_count(), 1);
}

#[tokio::test]
async fn test_check_is_idempotent() {
    let repo = repo_with_vi_a().await;
    let draft = single_period("VII", "B", "Monday", "10:30", "11:15", "Mr. Roy");

    let first = check_routine_draft(&repo, draft.clone(), TeacherMatching::Exact)
        .await
        .unwrap();
    let second = check_routine_draft(&repo, draft, TeacherMatching::Exact)
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(repo.routine_count(), 1);
}

#[tokio::test]
async fn test_malformed_time_is_rejected_before_conflict_scan() {
    let repo = repo_with_vi_a().await;

    let err = save_routine(
        &repo,
        single_period("VII", "B", "Monday", "bad", "11:15", "Mr. Roy"),
        TeacherMatching::Exact,
    )
    .await
    .unwrap_err();

    let validation = match err {
        RoutineError::Validation(validation) => validation,
        other => panic!("expected a validation error, got {other:?}"),
    };
    assert_eq!(validation.issues.len(), 1);
    assert_eq!(
        validation.issues[0].field,
        "weekSchedule[0].periods[0].startTime"
    );
    assert_eq!(repo.routine_count(), 1);
}

#[tokio::test]
async fn test_teacher_names_match_exactly_by_default() {
    let repo = repo_with_vi_a().await;
    let draft = single_period("VII", "B", "Monday", "10:30", "11:15", "mr. roy ");

    save_routine(&repo, draft.clone(), TeacherMatching::Exact)
        .await
        .unwrap();
    delete_routine(&repo, &RoutineKey::new("VII", "B"))
        .await
        .unwrap();

    let result = save_routine(&repo, draft, TeacherMatching::Normalized).await;
    assert!(matches!(result, Err(RoutineError::Conflict(_))));
}

#[tokio::test]
async fn test_dry_run_reports_every_conflict() {
    let repo = LocalRepository::new();
    save_routine(
        &repo,
        routine(
            "VI",
            "A",
            vec![
                ("Monday", vec![period("10:00", "10:45", "Maths", "Mr. Roy")]),
                ("Friday", vec![period("12:00", "12:45", "English", "Ms. Sen")]),
            ],
        ),
        TeacherMatching::Exact,
    )
    .await
    .unwrap();

    let conflicts = check_routine_draft(
        &repo,
        routine(
            "VII",
            "B",
            vec![
                ("Monday", vec![period("10:30", "11:15", "Maths", "Mr. Roy")]),
                ("Friday", vec![period("12:30", "13:15", "English", "Ms. Sen")]),
            ],
        ),
        TeacherMatching::Exact,
    )
    .await
    .unwrap();

    let teachers: Vec<&str> = conflicts.iter().map(|c| c.teacher.as_str()).collect();
    assert_eq!(teachers, vec!["Mr. Roy", "Ms. Sen"]);
    assert_eq!(repo.routine_count(), 1);
}
