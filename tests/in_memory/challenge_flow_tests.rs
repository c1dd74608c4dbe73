//! Lifecycle and fan-out flows exercised end to end against the in-memory
//! adapter.

use super::helpers::{
    Harness, add_every_day_template, add_template, create_challenge, harness,
};
use chrono::{Datelike, Utc};
use rstest::rstest;
use rygoal::challenge::domain::{ChallengeStatus, UserId, WeekdayMask};
use rygoal::challenge::services::{ChallengeServiceError, CreateChallengeRequest};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn three_day_challenge_with_daily_task_yields_three_rows(harness: Harness) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    add_every_day_template(&harness, challenge.id(), owner).await;

    let started = harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");

    let range = started.active_range().expect("started challenge has a range");
    assert_eq!(range.len(), 3);

    let mut total = 0;
    for day in range.days() {
        let rows = harness
            .statuses
            .list_for_date(challenge.id(), owner, day)
            .await
            .expect("listing should succeed");
        assert_eq!(rows.len(), 1, "one member and one daily task per day");
        total += rows.len();
    }
    assert_eq!(total, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fan_out_scales_with_templates_and_days(harness: Harness) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, 4).await;
    add_every_day_template(&harness, challenge.id(), owner).await;
    add_every_day_template(&harness, challenge.id(), owner).await;

    let started = harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");

    let range = started.active_range().expect("started challenge has a range");
    let mut total = 0;
    for day in range.days() {
        total += harness
            .statuses
            .list_for_date(challenge.id(), owner, day)
            .await
            .expect("listing should succeed")
            .len();
    }
    assert_eq!(total, 8, "two daily templates across four days, one member");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn single_weekday_template_covers_at_most_one_day_per_week(harness: Harness) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, 7).await;
    // Whatever today's weekday is, a one-bit mask matches exactly once in a
    // seven-day range.
    let today_bit = 1_u8 << Utc::now().date_naive().weekday().num_days_from_sunday();
    add_template(&harness, challenge.id(), owner, today_bit).await;

    let started = harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");

    let range = started.active_range().expect("started challenge has a range");
    let mut total = 0;
    for day in range.days() {
        total += harness
            .statuses
            .list_for_date(challenge.id(), owner, day)
            .await
            .expect("listing should succeed")
            .len();
    }
    assert_eq!(total, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn lifecycle_runs_draft_started_finished(harness: Harness) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, 2).await;
    assert_eq!(challenge.status(), ChallengeStatus::Draft);

    let started = harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");
    assert_eq!(started.status(), ChallengeStatus::Started);

    let finished = harness
        .lifecycle
        .finish(challenge.id(), owner)
        .await
        .expect("finish should succeed");
    assert_eq!(finished.status(), ChallengeStatus::Finished);

    let restart = harness.lifecycle.start(challenge.id(), owner).await;
    assert!(matches!(
        restart,
        Err(ChallengeServiceError::Transition(err)) if err.status == ChallengeStatus::Finished
    ));
}

#[rstest]
#[case(1)]
#[case(7)]
#[tokio::test(flavor = "multi_thread")]
async fn duration_boundaries_are_inclusive(harness: Harness, #[case] days: u8) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, days).await;
    add_template(&harness, challenge.id(), owner, WeekdayMask::EVERY_DAY.bits()).await;

    let started = harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");

    let range = started.active_range().expect("started challenge has a range");
    assert_eq!(range.len(), u64::from(days));
}

#[rstest]
#[case(0)]
#[case(8)]
#[tokio::test(flavor = "multi_thread")]
async fn duration_outside_boundaries_is_rejected(harness: Harness, #[case] days: u8) {
    let result = harness
        .lifecycle
        .create(CreateChallengeRequest {
            title: "Hydration week".to_owned(),
            description: String::new(),
            days,
            owner: UserId::new(),
        })
        .await;

    assert!(matches!(result, Err(ChallengeServiceError::Validation(_))));
}
