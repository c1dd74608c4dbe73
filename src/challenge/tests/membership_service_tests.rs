//! Service orchestration tests for invitations, acceptance, and
//! unsubscription.

use super::fixtures::{
    ACCEPT_URL, FixedClock, draft_challenge, every_day_template, join_as_participant, services,
    services_with,
};
use crate::challenge::adapters::memory::{InMemoryChallengeRepository, RecordingNotifier};
use crate::challenge::domain::{ChallengeId, ChallengeStatus, UserId};
use crate::challenge::ports::ChallengeRepository;
use crate::challenge::services::{
    ChallengeServiceError, InvitationTokenError, InviteUserRequest,
};
use chrono::Days;
use mockable::DefaultClock;
use rstest::rstest;
use std::sync::Arc;

fn invite_request(challenge_id: ChallengeId, caller: UserId, invitee: UserId) -> InviteUserRequest {
    InviteUserRequest {
        challenge_id,
        caller,
        invitee,
        invitee_email: "invitee@example.com".to_owned(),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invite_creates_pending_invitation_and_notifies() {
    let services = services();
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;

    let invitation = services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");

    assert!(!invitation.is_accepted());
    let stored = services
        .repository
        .find_invitation(challenge.id(), invitee)
        .await
        .expect("lookup should succeed");
    assert_eq!(stored, Some(invitation));

    let sent = services.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "invitee@example.com");
    assert_eq!(sent[0].subject, "Challenge Invitation");
    assert!(sent[0].body.contains(challenge.title().as_str()));
    assert!(sent[0].body.contains(&format!("{ACCEPT_URL}?token=")));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invite_by_participant_is_forbidden() {
    let services = services();
    let owner = UserId::new();
    let participant = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;
    join_as_participant(&services, challenge.id(), participant).await;

    let result = services
        .membership
        .invite(invite_request(challenge.id(), participant, UserId::new()))
        .await;

    assert!(matches!(result, Err(ChallengeServiceError::Forbidden)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invite_existing_member_is_rejected() {
    let services = services();
    let owner = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;

    let result = services
        .membership
        .invite(invite_request(challenge.id(), owner, owner))
        .await;

    assert!(matches!(result, Err(ChallengeServiceError::AlreadyMember)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invite_twice_is_rejected() {
    let services = services();
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;
    services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("first invite should succeed");

    let result = services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await;

    assert!(matches!(result, Err(ChallengeServiceError::AlreadyInvited)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invite_survives_notification_failure() {
    let services = services_with(
        Arc::new(InMemoryChallengeRepository::new()),
        Arc::new(RecordingNotifier::failing()),
        FixedClock::wednesday_noon(),
    );
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;

    services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed despite delivery failure");

    let stored = services
        .repository
        .find_invitation(challenge.id(), invitee)
        .await
        .expect("lookup should succeed");
    assert!(stored.is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accept_creates_participant_membership() {
    let services = services();
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;
    services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");

    let token = services
        .tokens
        .issue(invitee, challenge.id(), &DefaultClock)
        .expect("token issuance should succeed");
    let joined = services
        .membership
        .accept(&token, invitee)
        .await
        .expect("accept should succeed");
    assert_eq!(joined.id(), challenge.id());

    let membership = services
        .repository
        .find_membership(challenge.id(), invitee)
        .await
        .expect("lookup should succeed")
        .expect("membership should exist");
    assert!(!membership.is_owner());

    let invitation = services
        .repository
        .find_invitation(challenge.id(), invitee)
        .await
        .expect("lookup should succeed")
        .expect("invitation should remain");
    assert!(invitation.is_accepted());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accept_replay_is_rejected() {
    let services = services();
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;
    services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");
    let token = services
        .tokens
        .issue(invitee, challenge.id(), &DefaultClock)
        .expect("token issuance should succeed");
    services
        .membership
        .accept(&token, invitee)
        .await
        .expect("first accept should succeed");

    let replay = services.membership.accept(&token, invitee).await;

    assert!(matches!(
        replay,
        Err(ChallengeServiceError::InvitationAlreadyAccepted)
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accept_by_wrong_recipient_is_rejected() {
    let services = services();
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;
    services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");
    let token = services
        .tokens
        .issue(invitee, challenge.id(), &DefaultClock)
        .expect("token issuance should succeed");

    let result = services.membership.accept(&token, UserId::new()).await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::InvalidToken(
            InvitationTokenError::WrongRecipient
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accept_garbage_token_is_rejected() {
    let services = services();

    let result = services.membership.accept("not-a-token", UserId::new()).await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::InvalidToken(
            InvitationTokenError::Malformed
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accept_without_invitation_is_not_found() {
    let services = services();
    let owner = UserId::new();
    let stranger = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;

    let token = services
        .tokens
        .issue(stranger, challenge.id(), &DefaultClock)
        .expect("token issuance should succeed");
    let result = services.membership.accept(&token, stranger).await;

    assert!(matches!(result, Err(ChallengeServiceError::NotFound)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accept_on_start_day_generates_full_range_rows() {
    let services = services();
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;
    let template = every_day_template(&services, challenge.id(), owner).await;
    services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");
    services
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");

    let token = services
        .tokens
        .issue(invitee, challenge.id(), &DefaultClock)
        .expect("token issuance should succeed");
    services
        .membership
        .accept(&token, invitee)
        .await
        .expect("accept on the start day should succeed");

    let today = services.clock.instant().date_naive();
    for offset in 0..3 {
        let row = services
            .repository
            .find_status(invitee, template.id(), today + Days::new(offset))
            .await
            .expect("status lookup should succeed");
        assert!(row.is_some(), "expected a row for day offset {offset}");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accept_after_start_day_hits_closed_join_window() {
    let repository = Arc::new(InMemoryChallengeRepository::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let yesterday = services_with(
        Arc::clone(&repository),
        Arc::clone(&notifier),
        FixedClock::wednesday_noon().minus_days(1),
    );
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&yesterday, owner, 3).await;
    yesterday
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");
    yesterday
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");

    let today = services_with(repository, notifier, FixedClock::wednesday_noon());
    let token = today
        .tokens
        .issue(invitee, challenge.id(), &DefaultClock)
        .expect("token issuance should succeed");
    let result = today.membership.accept(&token, invitee).await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::JoinWindowClosed)
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsubscribe_removes_participant_but_keeps_history() {
    let services = services();
    let owner = UserId::new();
    let invitee = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;
    let template = every_day_template(&services, challenge.id(), owner).await;
    services
        .membership
        .invite(invite_request(challenge.id(), owner, invitee))
        .await
        .expect("invite should succeed");
    services
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");
    let token = services
        .tokens
        .issue(invitee, challenge.id(), &DefaultClock)
        .expect("token issuance should succeed");
    services
        .membership
        .accept(&token, invitee)
        .await
        .expect("accept should succeed");

    services
        .membership
        .unsubscribe(challenge.id(), invitee)
        .await
        .expect("unsubscribe should succeed");

    let membership = services
        .repository
        .find_membership(challenge.id(), invitee)
        .await
        .expect("lookup should succeed");
    assert!(membership.is_none());

    let today = services.clock.instant().date_naive();
    let row = services
        .repository
        .find_status(invitee, template.id(), today)
        .await
        .expect("status lookup should succeed");
    assert!(row.is_some(), "historical rows survive unsubscription");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn owner_cannot_unsubscribe() {
    let services = services();
    let owner = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;

    let result = services.membership.unsubscribe(challenge.id(), owner).await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::OwnerCannotLeave)
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn non_member_unsubscribe_is_not_found() {
    let services = services();
    let challenge = draft_challenge(&services, UserId::new(), 3).await;

    let result = services
        .membership
        .unsubscribe(challenge.id(), UserId::new())
        .await;

    assert!(matches!(result, Err(ChallengeServiceError::NotFound)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsubscribe_from_finished_challenge_is_a_conflict() {
    let services = services();
    let owner = UserId::new();
    let participant = UserId::new();
    let challenge = draft_challenge(&services, owner, 3).await;
    join_as_participant(&services, challenge.id(), participant).await;
    services
        .lifecycle
        .start(challenge.id(), owner)
        .await
        .expect("start should succeed");
    services
        .lifecycle
        .finish(challenge.id(), owner)
        .await
        .expect("finish should succeed");

    let result = services
        .membership
        .unsubscribe(challenge.id(), participant)
        .await;

    assert!(matches!(
        result,
        Err(ChallengeServiceError::Transition(err)) if err.status == ChallengeStatus::Finished
    ));
}
