//! `PostgreSQL` repository implementation for challenge storage.

use super::{
    models::{ChallengeRow, InvitationRow, MembershipRow, StatusRow, TemplateRow},
    schema::{challenge_invitations, challenge_members, challenges, task_statuses, task_templates},
};
use crate::challenge::{
    domain::{
        Challenge, ChallengeId, Invitation, Membership, TaskStatus, TaskTemplate, TemplateId,
        UserId,
    },
    ports::{ChallengeRepository, ChallengeRepositoryError, ChallengeRepositoryResult},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by challenge adapters.
pub type ChallengePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed challenge repository.
///
/// Multi-row operations run inside a single database transaction so that
/// the all-or-nothing contract of the port holds under concurrent writers.
#[derive(Debug, Clone)]
pub struct PostgresChallengeRepository {
    pool: ChallengePgPool,
}

impl From<DieselError> for ChallengeRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl PostgresChallengeRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ChallengePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> ChallengeRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> ChallengeRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(ChallengeRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(ChallengeRepositoryError::persistence)?
    }
}

#[async_trait]
impl ChallengeRepository for PostgresChallengeRepository {
    async fn create_challenge(
        &self,
        challenge: &Challenge,
        owner: &Membership,
    ) -> ChallengeRepositoryResult<()> {
        let challenge_id = challenge.id();
        let challenge_row = ChallengeRow::from_domain(challenge);
        let owner_row = MembershipRow::from_domain(owner);

        self.run_blocking(move |connection| {
            connection.transaction::<_, ChallengeRepositoryError, _>(|tx| {
                diesel::insert_into(challenges::table)
                    .values(&challenge_row)
                    .execute(tx)
                    .map_err(|err| {
                        unique_violation(err, || {
                            ChallengeRepositoryError::DuplicateChallenge(challenge_id)
                        })
                    })?;
                insert_membership(tx, &owner_row)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_challenge(
        &self,
        id: ChallengeId,
    ) -> ChallengeRepositoryResult<Option<Challenge>> {
        self.run_blocking(move |connection| {
            let row = challenges::table
                .find(id.into_inner())
                .select(ChallengeRow::as_select())
                .first::<ChallengeRow>(connection)
                .optional()?;
            row.map(ChallengeRow::into_domain).transpose()
        })
        .await
    }

    async fn challenges_for_user(&self, user: UserId) -> ChallengeRepositoryResult<Vec<Challenge>> {
        self.run_blocking(move |connection| {
            let rows = challenges::table
                .inner_join(
                    challenge_members::table
                        .on(challenge_members::challenge_id.eq(challenges::id)),
                )
                .filter(challenge_members::user_id.eq(user.into_inner()))
                .select(ChallengeRow::as_select())
                .order((challenges::created_at.asc(), challenges::id.asc()))
                .load::<ChallengeRow>(connection)?;
            rows.into_iter().map(ChallengeRow::into_domain).collect()
        })
        .await
    }

    async fn update_challenge(&self, challenge: &Challenge) -> ChallengeRepositoryResult<()> {
        let challenge_id = challenge.id();
        let row = ChallengeRow::from_domain(challenge);

        self.run_blocking(move |connection| {
            let updated = diesel::update(challenges::table.find(challenge_id.into_inner()))
                .set(&row)
                .execute(connection)?;
            if updated == 0 {
                return Err(ChallengeRepositoryError::ChallengeNotFound(challenge_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_challenge(&self, id: ChallengeId) -> ChallengeRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, ChallengeRepositoryError, _>(|tx| {
                let template_ids = task_templates::table
                    .filter(task_templates::challenge_id.eq(id.into_inner()))
                    .select(task_templates::id);
                diesel::delete(
                    task_statuses::table.filter(task_statuses::template_id.eq_any(template_ids)),
                )
                .execute(tx)?;
                diesel::delete(
                    task_templates::table
                        .filter(task_templates::challenge_id.eq(id.into_inner())),
                )
                .execute(tx)?;
                diesel::delete(
                    challenge_invitations::table
                        .filter(challenge_invitations::challenge_id.eq(id.into_inner())),
                )
                .execute(tx)?;
                diesel::delete(
                    challenge_members::table
                        .filter(challenge_members::challenge_id.eq(id.into_inner())),
                )
                .execute(tx)?;
                let deleted =
                    diesel::delete(challenges::table.find(id.into_inner())).execute(tx)?;
                if deleted == 0 {
                    return Err(ChallengeRepositoryError::ChallengeNotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn start_challenge(
        &self,
        challenge: &Challenge,
        statuses: &[TaskStatus],
    ) -> ChallengeRepositoryResult<()> {
        let challenge_id = challenge.id();
        let challenge_row = ChallengeRow::from_domain(challenge);
        let status_rows = statuses.to_vec();

        self.run_blocking(move |connection| {
            connection.transaction::<_, ChallengeRepositoryError, _>(|tx| {
                let updated = diesel::update(challenges::table.find(challenge_id.into_inner()))
                    .set(&challenge_row)
                    .execute(tx)?;
                if updated == 0 {
                    return Err(ChallengeRepositoryError::ChallengeNotFound(challenge_id));
                }
                insert_statuses(tx, &status_rows)?;
                Ok(())
            })
        })
        .await
    }

    async fn find_membership(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<Option<Membership>> {
        self.run_blocking(move |connection| {
            let row = challenge_members::table
                .find((challenge.into_inner(), user.into_inner()))
                .select(MembershipRow::as_select())
                .first::<MembershipRow>(connection)
                .optional()?;
            row.map(MembershipRow::into_domain).transpose()
        })
        .await
    }

    async fn members_of(
        &self,
        challenge: ChallengeId,
    ) -> ChallengeRepositoryResult<Vec<Membership>> {
        self.run_blocking(move |connection| {
            let rows = challenge_members::table
                .filter(challenge_members::challenge_id.eq(challenge.into_inner()))
                .select(MembershipRow::as_select())
                .order((
                    challenge_members::joined_at.asc(),
                    challenge_members::user_id.asc(),
                ))
                .load::<MembershipRow>(connection)?;
            rows.into_iter().map(MembershipRow::into_domain).collect()
        })
        .await
    }

    async fn remove_membership(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<()> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(
                challenge_members::table.find((challenge.into_inner(), user.into_inner())),
            )
            .execute(connection)?;
            if deleted == 0 {
                return Err(ChallengeRepositoryError::MembershipNotFound { challenge, user });
            }
            Ok(())
        })
        .await
    }

    async fn create_invitation(&self, invitation: &Invitation) -> ChallengeRepositoryResult<()> {
        let challenge = invitation.challenge_id();
        let user = invitation.user_id();
        let row = InvitationRow::from_domain(invitation);

        self.run_blocking(move |connection| {
            diesel::insert_into(challenge_invitations::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    unique_violation(err, || ChallengeRepositoryError::DuplicateInvitation {
                        challenge,
                        user,
                    })
                })?;
            Ok(())
        })
        .await
    }

    async fn find_invitation(
        &self,
        challenge: ChallengeId,
        user: UserId,
    ) -> ChallengeRepositoryResult<Option<Invitation>> {
        self.run_blocking(move |connection| {
            let row = challenge_invitations::table
                .find((challenge.into_inner(), user.into_inner()))
                .select(InvitationRow::as_select())
                .first::<InvitationRow>(connection)
                .optional()?;
            row.map(InvitationRow::into_domain).transpose()
        })
        .await
    }

    async fn accept_invitation(
        &self,
        invitation: &Invitation,
        membership: &Membership,
        statuses: &[TaskStatus],
    ) -> ChallengeRepositoryResult<()> {
        let challenge = invitation.challenge_id();
        let user = invitation.user_id();
        let invitation_row = InvitationRow::from_domain(invitation);
        let membership_row = MembershipRow::from_domain(membership);
        let status_rows = statuses.to_vec();

        self.run_blocking(move |connection| {
            connection.transaction::<_, ChallengeRepositoryError, _>(|tx| {
                let updated = diesel::update(
                    challenge_invitations::table
                        .find((challenge.into_inner(), user.into_inner())),
                )
                .set(&invitation_row)
                .execute(tx)?;
                if updated == 0 {
                    return Err(ChallengeRepositoryError::InvitationNotFound { challenge, user });
                }
                insert_membership(tx, &membership_row)?;
                insert_statuses(tx, &status_rows)?;
                Ok(())
            })
        })
        .await
    }

    async fn create_template(&self, template: &TaskTemplate) -> ChallengeRepositoryResult<()> {
        let template_id = template.id();
        let row = TemplateRow::from_domain(template);

        self.run_blocking(move |connection| {
            diesel::insert_into(task_templates::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| {
                    unique_violation(err, || {
                        ChallengeRepositoryError::DuplicateTemplate(template_id)
                    })
                })?;
            Ok(())
        })
        .await
    }

    async fn create_templates(
        &self,
        templates: &[TaskTemplate],
    ) -> ChallengeRepositoryResult<()> {
        let rows: Vec<(TemplateId, TemplateRow)> = templates
            .iter()
            .map(|template| (template.id(), TemplateRow::from_domain(template)))
            .collect();

        self.run_blocking(move |connection| {
            connection.transaction::<_, ChallengeRepositoryError, _>(|tx| {
                for (template_id, row) in &rows {
                    diesel::insert_into(task_templates::table)
                        .values(row)
                        .execute(tx)
                        .map_err(|err| {
                            unique_violation(err, || {
                                ChallengeRepositoryError::DuplicateTemplate(*template_id)
                            })
                        })?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn update_template(&self, template: &TaskTemplate) -> ChallengeRepositoryResult<()> {
        let template_id = template.id();
        let row = TemplateRow::from_domain(template);

        self.run_blocking(move |connection| {
            let updated = diesel::update(task_templates::table.find(template_id.into_inner()))
                .set(&row)
                .execute(connection)?;
            if updated == 0 {
                return Err(ChallengeRepositoryError::TemplateNotFound(template_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete_template(&self, id: TemplateId) -> ChallengeRepositoryResult<()> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, ChallengeRepositoryError, _>(|tx| {
                diesel::delete(
                    task_statuses::table.filter(task_statuses::template_id.eq(id.into_inner())),
                )
                .execute(tx)?;
                let deleted =
                    diesel::delete(task_templates::table.find(id.into_inner())).execute(tx)?;
                if deleted == 0 {
                    return Err(ChallengeRepositoryError::TemplateNotFound(id));
                }
                Ok(())
            })
        })
        .await
    }

    async fn find_template(
        &self,
        id: TemplateId,
    ) -> ChallengeRepositoryResult<Option<TaskTemplate>> {
        self.run_blocking(move |connection| {
            let row = task_templates::table
                .find(id.into_inner())
                .select(TemplateRow::as_select())
                .first::<TemplateRow>(connection)
                .optional()?;
            row.map(TemplateRow::into_domain).transpose()
        })
        .await
    }

    async fn templates_for_challenge(
        &self,
        challenge: ChallengeId,
    ) -> ChallengeRepositoryResult<Vec<TaskTemplate>> {
        self.run_blocking(move |connection| {
            let rows = task_templates::table
                .filter(task_templates::challenge_id.eq(challenge.into_inner()))
                .select(TemplateRow::as_select())
                .order((task_templates::created_at.asc(), task_templates::id.asc()))
                .load::<TemplateRow>(connection)?;
            rows.into_iter().map(TemplateRow::into_domain).collect()
        })
        .await
    }

    async fn find_status(
        &self,
        user: UserId,
        template: TemplateId,
        date: NaiveDate,
    ) -> ChallengeRepositoryResult<Option<TaskStatus>> {
        self.run_blocking(move |connection| {
            let row = task_statuses::table
                .find((user.into_inner(), template.into_inner(), date))
                .select(StatusRow::as_select())
                .first::<StatusRow>(connection)
                .optional()?;
            row.map(StatusRow::into_domain).transpose()
        })
        .await
    }

    async fn update_status(&self, status: &TaskStatus) -> ChallengeRepositoryResult<()> {
        let user = status.user_id();
        let template = status.template_id();
        let date = status.date();
        let row = StatusRow::from_domain(status);

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                task_statuses::table.find((user.into_inner(), template.into_inner(), date)),
            )
            .set(&row)
            .execute(connection)?;
            if updated == 0 {
                return Err(ChallengeRepositoryError::StatusNotFound {
                    user,
                    template,
                    date,
                });
            }
            Ok(())
        })
        .await
    }

    async fn statuses_for_date(
        &self,
        challenge: ChallengeId,
        date: NaiveDate,
    ) -> ChallengeRepositoryResult<Vec<(TaskTemplate, TaskStatus)>> {
        self.run_blocking(move |connection| {
            let rows = task_statuses::table
                .inner_join(task_templates::table)
                .filter(task_templates::challenge_id.eq(challenge.into_inner()))
                .filter(task_statuses::date.eq(date))
                .select((TemplateRow::as_select(), StatusRow::as_select()))
                .order((
                    task_templates::id.asc(),
                    task_statuses::user_id.asc(),
                ))
                .load::<(TemplateRow, StatusRow)>(connection)?;
            rows.into_iter()
                .map(|(template, status)| {
                    Ok((template.into_domain()?, status.into_domain()?))
                })
                .collect()
        })
        .await
    }
}

fn unique_violation(
    err: DieselError,
    duplicate: impl FnOnce() -> ChallengeRepositoryError,
) -> ChallengeRepositoryError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => duplicate(),
        _ => ChallengeRepositoryError::persistence(err),
    }
}

fn insert_membership(
    connection: &mut PgConnection,
    row: &MembershipRow,
) -> ChallengeRepositoryResult<()> {
    diesel::insert_into(challenge_members::table)
        .values(row)
        .execute(connection)
        .map_err(|err| {
            unique_violation(err, || ChallengeRepositoryError::DuplicateMembership {
                challenge: ChallengeId::from_uuid(row.challenge_id),
                user: UserId::from_uuid(row.user_id),
            })
        })?;
    Ok(())
}

// Rows are inserted one at a time so a unique violation can name the exact
// colliding `(user, template, date)` key.
fn insert_statuses(
    connection: &mut PgConnection,
    statuses: &[TaskStatus],
) -> ChallengeRepositoryResult<()> {
    for status in statuses {
        let row = StatusRow::from_domain(status);
        diesel::insert_into(task_statuses::table)
            .values(&row)
            .execute(connection)
            .map_err(|err| {
                unique_violation(err, || ChallengeRepositoryError::DuplicateStatus {
                    user: status.user_id(),
                    template: status.template_id(),
                    date: status.date(),
                })
            })?;
    }
    Ok(())
}
