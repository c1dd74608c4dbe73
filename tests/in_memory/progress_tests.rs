//! Daily progress recording flows.

use super::helpers::{Harness, add_every_day_template, create_challenge, harness};
use chrono::{Days, Utc};
use rstest::rstest;
use rygoal::challenge::domain::{
    ChallengeDomainError, ChallengeStatus, Completion, UserId,
};
use rygoal::challenge::services::{ChallengeServiceError, UpdateTaskStatusRequest};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn member_records_and_revises_todays_completion(harness: Harness) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    let template = add_every_day_template(&harness, challenge.id(), owner).await;
    harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");
    let today = Utc::now().date_naive();

    let completed = harness
        .statuses
        .update(UpdateTaskStatusRequest {
            template_id: template.id(),
            challenge_id: challenge.id(),
            caller: owner,
            date: today,
            completion: Completion::Completed,
        })
        .await
        .expect("recording completion should succeed");
    assert_eq!(completed.completion(), Completion::Completed);

    let revised = harness
        .statuses
        .update(UpdateTaskStatusRequest {
            template_id: template.id(),
            challenge_id: challenge.id(),
            caller: owner,
            date: today,
            completion: Completion::NotCompleted,
        })
        .await
        .expect("revising the same day should succeed");
    assert_eq!(revised.completion(), Completion::NotCompleted);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backdated_updates_are_rejected(harness: Harness) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    let template = add_every_day_template(&harness, challenge.id(), owner).await;
    harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");
    let yesterday = Utc::now().date_naive() - Days::new(1);

    let result = harness
        .statuses
        .update(UpdateTaskStatusRequest {
            template_id: template.id(),
            challenge_id: challenge.id(),
            caller: owner,
            date: yesterday,
            completion: Completion::Completed,
        })
        .await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::Validation(
            ChallengeDomainError::StatusDateNotToday { .. }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn progress_on_a_draft_challenge_is_a_conflict(harness: Harness) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    let template = add_every_day_template(&harness, challenge.id(), owner).await;

    let result = harness
        .statuses
        .update(UpdateTaskStatusRequest {
            template_id: template.id(),
            challenge_id: challenge.id(),
            caller: owner,
            date: Utc::now().date_naive(),
            completion: Completion::Completed,
        })
        .await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::Transition(err)) if err.status == ChallengeStatus::Draft
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn progress_on_a_finished_challenge_is_a_conflict(harness: Harness) {
    let owner = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    let template = add_every_day_template(&harness, challenge.id(), owner).await;
    harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");
    harness
        .lifecycle
        .finish(challenge.id(), owner)
        .await
        .expect("finish should succeed");

    let result = harness
        .statuses
        .update(UpdateTaskStatusRequest {
            template_id: template.id(),
            challenge_id: challenge.id(),
            caller: owner,
            date: Utc::now().date_naive(),
            completion: Completion::Completed,
        })
        .await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::Transition(err)) if err.status == ChallengeStatus::Finished
    ));
}
