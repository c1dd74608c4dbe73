//! Shared helpers for in-memory challenge workflow tests.

use mockable::DefaultClock;
use rstest::fixture;
use rygoal::challenge::{
    adapters::memory::{InMemoryChallengeRepository, RecordingNotifier},
    domain::{Challenge, ChallengeId, TaskTemplate, UserId, WeekdayMask},
    services::{
        ChallengeLifecycleService, CreateChallengeRequest, CreateTemplateRequest,
        InvitationTokenService, MembershipService, TaskStatusService, TaskTemplateService,
    },
};
use std::sync::Arc;

/// Signing secret shared by every test harness.
pub const SECRET: &[u8] = b"integration-test-secret";

/// Address invitation links point at in tests.
pub const ACCEPT_URL: &str = "https://rygoal.test/invitations/accept";

/// Every challenge service wired over one shared in-memory repository.
pub struct Harness {
    pub repository: Arc<InMemoryChallengeRepository>,
    pub notifier: Arc<RecordingNotifier>,
    pub tokens: Arc<InvitationTokenService>,
    pub lifecycle: ChallengeLifecycleService<InMemoryChallengeRepository, DefaultClock>,
    pub membership: MembershipService<InMemoryChallengeRepository, RecordingNotifier, DefaultClock>,
    pub templates: TaskTemplateService<InMemoryChallengeRepository, DefaultClock>,
    pub statuses: TaskStatusService<InMemoryChallengeRepository, DefaultClock>,
}

/// Provides a fresh, fully wired harness for each test.
#[fixture]
pub fn harness() -> Harness {
    let repository = Arc::new(InMemoryChallengeRepository::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let tokens = Arc::new(InvitationTokenService::new(SECRET));
    let clock = Arc::new(DefaultClock);
    Harness {
        lifecycle: ChallengeLifecycleService::new(Arc::clone(&repository), Arc::clone(&clock)),
        membership: MembershipService::new(
            Arc::clone(&repository),
            Arc::clone(&notifier),
            Arc::clone(&tokens),
            Arc::clone(&clock),
            ACCEPT_URL,
        ),
        templates: TaskTemplateService::new(Arc::clone(&repository), Arc::clone(&clock)),
        statuses: TaskStatusService::new(Arc::clone(&repository), clock),
        repository,
        notifier,
        tokens,
    }
}

/// Creates a draft challenge owned by `owner`.
pub async fn create_challenge(harness: &Harness, owner: UserId, days: u8) -> Challenge {
    harness
        .lifecycle
        .create(CreateChallengeRequest {
            title: "Hydration week".to_owned(),
            description: "Drink two litres every day".to_owned(),
            days,
            owner,
        })
        .await
        .expect("challenge creation should succeed")
}

/// Adds a template active on the given weekday bits.
pub async fn add_template(
    harness: &Harness,
    challenge: ChallengeId,
    owner: UserId,
    weekdays: u8,
) -> TaskTemplate {
    harness
        .templates
        .create(
            challenge,
            owner,
            CreateTemplateRequest {
                title: "Drink water".to_owned(),
                description: "Two litres".to_owned(),
                weekdays,
            },
        )
        .await
        .expect("template creation should succeed")
}

/// Adds a template active on every weekday.
pub async fn add_every_day_template(
    harness: &Harness,
    challenge: ChallengeId,
    owner: UserId,
) -> TaskTemplate {
    add_template(harness, challenge, owner, WeekdayMask::EVERY_DAY.bits()).await
}

/// Pulls the signed token out of the latest invitation notification body.
pub fn token_from_last_notification(harness: &Harness) -> String {
    let sent = harness.notifier.sent();
    let body = &sent.last().expect("a notification should have been sent").body;
    let (_, tail) = body
        .split_once("?token=")
        .expect("notification body should carry a token link");
    tail.split_whitespace()
        .next()
        .expect("token should follow the link")
        .to_owned()
}
