//! Adapter-level constraint tests for the in-memory repository.

use mockable::DefaultClock;
use rstest::{fixture, rstest};
use rygoal::challenge::adapters::memory::InMemoryChallengeRepository;
use rygoal::challenge::domain::{
    Challenge, ChallengeStatus, DurationDays, Invitation, Membership, TaskStatus, TaskTemplate,
    Title, UserId, WeekdayMask,
};
use rygoal::challenge::ports::{ChallengeRepository, ChallengeRepositoryError};

#[fixture]
fn repo() -> InMemoryChallengeRepository {
    InMemoryChallengeRepository::new()
}

fn draft_challenge() -> Challenge {
    Challenge::new(
        Title::new("Hydration week").expect("valid title"),
        "Drink two litres every day",
        DurationDays::new(3).expect("valid duration"),
        &DefaultClock,
    )
}

async fn seed_challenge(repo: &InMemoryChallengeRepository, owner: UserId) -> Challenge {
    let challenge = draft_challenge();
    let membership = Membership::owner(challenge.id(), owner, &DefaultClock);
    repo.create_challenge(&challenge, &membership)
        .await
        .expect("challenge creation should succeed");
    challenge
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_challenge_identifier_is_rejected(repo: InMemoryChallengeRepository) {
    let owner = UserId::new();
    let challenge = seed_challenge(&repo, owner).await;

    let membership = Membership::owner(challenge.id(), owner, &DefaultClock);
    let result = repo.create_challenge(&challenge, &membership).await;

    assert!(matches!(
        result,
        Err(ChallengeRepositoryError::DuplicateChallenge(id)) if id == challenge.id()
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_invitation_is_rejected(repo: InMemoryChallengeRepository) {
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = seed_challenge(&repo, owner).await;
    let invitation = Invitation::pending(challenge.id(), invitee, &DefaultClock);
    repo.create_invitation(&invitation)
        .await
        .expect("first invitation should succeed");

    let result = repo.create_invitation(&invitation).await;

    assert!(matches!(
        result,
        Err(ChallengeRepositoryError::DuplicateInvitation { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_rolls_back_on_status_overlap(repo: InMemoryChallengeRepository) {
    let owner = UserId::new();
    let participant = UserId::new();
    let mut challenge = seed_challenge(&repo, owner).await;

    let template = TaskTemplate::new(
        challenge.id(),
        Title::new("Drink water").expect("valid title"),
        "",
        WeekdayMask::EVERY_DAY,
        &DefaultClock,
    );
    repo.create_template(&template)
        .await
        .expect("template creation should succeed");

    // Seed a status row for the participant through the acceptance path.
    let mut invitation = Invitation::pending(challenge.id(), participant, &DefaultClock);
    repo.create_invitation(&invitation)
        .await
        .expect("invitation creation should succeed");
    invitation.accept(&DefaultClock);
    let membership = Membership::participant(challenge.id(), participant, &DefaultClock);
    let today = chrono::Utc::now().date_naive();
    let seeded = TaskStatus::fresh(participant, template.id(), today);
    repo.accept_invitation(&invitation, &membership, &[seeded])
        .await
        .expect("acceptance should succeed");

    // Starting with a row that collides on (user, template, date) must leave
    // the challenge untouched.
    challenge
        .start(today, &DefaultClock)
        .expect("state transition should succeed");
    let colliding = TaskStatus::fresh(participant, template.id(), today);
    let result = repo.start_challenge(&challenge, &[colliding]).await;

    assert!(matches!(
        result,
        Err(ChallengeRepositoryError::DuplicateStatus { .. })
    ));
    let stored = repo
        .find_challenge(challenge.id())
        .await
        .expect("lookup should succeed")
        .expect("challenge should exist");
    assert_eq!(stored.status(), ChallengeStatus::Draft);
    assert_eq!(stored.start_date(), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_challenge_cascades_everywhere(repo: InMemoryChallengeRepository) {
    let owner = UserId::new();
    let participant = UserId::new();
    let challenge = seed_challenge(&repo, owner).await;
    let template = TaskTemplate::new(
        challenge.id(),
        Title::new("Drink water").expect("valid title"),
        "",
        WeekdayMask::EVERY_DAY,
        &DefaultClock,
    );
    repo.create_template(&template)
        .await
        .expect("template creation should succeed");
    let mut invitation = Invitation::pending(challenge.id(), participant, &DefaultClock);
    repo.create_invitation(&invitation)
        .await
        .expect("invitation creation should succeed");
    invitation.accept(&DefaultClock);
    let membership = Membership::participant(challenge.id(), participant, &DefaultClock);
    let today = chrono::Utc::now().date_naive();
    let status = TaskStatus::fresh(participant, template.id(), today);
    repo.accept_invitation(&invitation, &membership, &[status])
        .await
        .expect("acceptance should succeed");

    repo.delete_challenge(challenge.id())
        .await
        .expect("delete should succeed");

    assert!(
        repo.find_challenge(challenge.id())
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    assert!(
        repo.find_membership(challenge.id(), owner)
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    assert!(
        repo.find_invitation(challenge.id(), participant)
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    assert!(
        repo.find_template(template.id())
            .await
            .expect("lookup should succeed")
            .is_none()
    );
    assert!(
        repo.find_status(participant, template.id(), today)
            .await
            .expect("lookup should succeed")
            .is_none()
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn remove_missing_membership_is_reported(repo: InMemoryChallengeRepository) {
    let challenge = seed_challenge(&repo, UserId::new()).await;

    let result = repo.remove_membership(challenge.id(), UserId::new()).await;

    assert!(matches!(
        result,
        Err(ChallengeRepositoryError::MembershipNotFound { .. })
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn statuses_for_date_pairs_rows_with_their_templates(repo: InMemoryChallengeRepository) {
    let owner = UserId::new();
    let mut challenge = seed_challenge(&repo, owner).await;
    let template = TaskTemplate::new(
        challenge.id(),
        Title::new("Drink water").expect("valid title"),
        "",
        WeekdayMask::EVERY_DAY,
        &DefaultClock,
    );
    repo.create_template(&template)
        .await
        .expect("template creation should succeed");

    let today = chrono::Utc::now().date_naive();
    challenge
        .start(today, &DefaultClock)
        .expect("state transition should succeed");
    let rows = vec![TaskStatus::fresh(owner, template.id(), today)];
    repo.start_challenge(&challenge, &rows)
        .await
        .expect("start should succeed");

    let listed = repo
        .statuses_for_date(challenge.id(), today)
        .await
        .expect("listing should succeed");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].0.id(), template.id());
    assert_eq!(listed[0].1.user_id(), owner);
    assert_eq!(listed[0].1.date(), today);
}
