//! Invitation and membership flows exercised end to end, including token
//! redemption straight out of the notification body.

use super::helpers::{
    Harness, add_every_day_template, create_challenge, harness, token_from_last_notification,
};
use rstest::rstest;
use rygoal::challenge::domain::{ChallengeId, UserId};
use rygoal::challenge::ports::ChallengeRepository;
use rygoal::challenge::services::{
    ChallengeServiceError, InvitationTokenError, InviteUserRequest,
};

fn invite(challenge_id: ChallengeId, caller: UserId, invitee: UserId) -> InviteUserRequest {
    InviteUserRequest {
        challenge_id,
        caller,
        invitee,
        invitee_email: "friend@example.com".to_owned(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invitation_token_from_notification_redeems_once(harness: Harness) {
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    harness
        .membership
        .invite(invite(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");

    let token = token_from_last_notification(&harness);
    let joined = harness
        .membership
        .accept(&token, invitee)
        .await
        .expect("accept should succeed");
    assert_eq!(joined.id(), challenge.id());

    let membership = harness
        .repository
        .find_membership(challenge.id(), invitee)
        .await
        .expect("lookup should succeed")
        .expect("membership should exist");
    assert!(!membership.is_owner());

    let replay = harness.membership.accept(&token, invitee).await;
    assert!(matches!(
        replay,
        Err(ChallengeServiceError::InvitationAlreadyAccepted)
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn token_is_bound_to_the_invited_user(harness: Harness) {
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    harness
        .membership
        .invite(invite(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");

    let token = token_from_last_notification(&harness);
    let result = harness.membership.accept(&token, UserId::new()).await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::InvalidToken(
            InvitationTokenError::WrongRecipient
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn member_who_joins_on_start_day_receives_all_rows(harness: Harness) {
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    let template = add_every_day_template(&harness, challenge.id(), owner).await;
    harness
        .membership
        .invite(invite(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");
    let started = harness
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");

    let token = token_from_last_notification(&harness);
    harness
        .membership
        .accept(&token, invitee)
        .await
        .expect("accept on the start day should succeed");

    let range = started.active_range().expect("started challenge has a range");
    for day in range.days() {
        let row = harness
            .repository
            .find_status(invitee, template.id(), day)
            .await
            .expect("status lookup should succeed");
        assert!(row.is_some(), "expected a generated row on {day}");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn participant_can_leave_but_owner_cannot(harness: Harness) {
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = create_challenge(&harness, owner, 3).await;
    harness
        .membership
        .invite(invite(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");
    let token = token_from_last_notification(&harness);
    harness
        .membership
        .accept(&token, invitee)
        .await
        .expect("accept should succeed");

    harness
        .membership
        .unsubscribe(challenge.id(), invitee)
        .await
        .expect("participant unsubscribe should succeed");
    let gone = harness
        .repository
        .find_membership(challenge.id(), invitee)
        .await
        .expect("lookup should succeed");
    assert!(gone.is_none());

    let owner_leave = harness.membership.unsubscribe(challenge.id(), owner).await;
    assert!(matches!(
        owner_leave,
        Err(ChallengeServiceError::OwnerCannotLeave)
    ));
}
