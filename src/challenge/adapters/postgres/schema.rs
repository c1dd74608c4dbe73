//! Diesel schema for challenge persistence.

diesel::table! {
    /// Challenge records.
    challenges (id) {
        /// Challenge identifier.
        id -> Uuid,
        /// Challenge title.
        #[max_length = 255]
        title -> Varchar,
        /// Challenge description.
        description -> Text,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Duration in days.
        days -> Int4,
        /// First active day; null while in draft.
        start_date -> Nullable<Date>,
        /// Exclusive end day; null while in draft.
        end_date -> Nullable<Date>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Membership rows binding users to challenges.
    challenge_members (challenge_id, user_id) {
        /// Owning challenge.
        challenge_id -> Uuid,
        /// Member's user identifier.
        user_id -> Uuid,
        /// Member role.
        #[max_length = 20]
        role -> Varchar,
        /// When the membership was created.
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Invitation rows gating participant memberships.
    challenge_invitations (challenge_id, user_id) {
        /// Challenge invited into.
        challenge_id -> Uuid,
        /// Invited user.
        user_id -> Uuid,
        /// Invitation status.
        #[max_length = 20]
        status -> Varchar,
        /// When the invitation was issued.
        invited_at -> Timestamptz,
        /// When the invitation was accepted, if it has been.
        responded_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Recurring task template records.
    task_templates (id) {
        /// Template identifier.
        id -> Uuid,
        /// Owning challenge.
        challenge_id -> Uuid,
        /// Template title.
        #[max_length = 255]
        title -> Varchar,
        /// Template description.
        description -> Text,
        /// Weekday recurrence mask, Sunday at bit zero.
        weekdays -> Int2,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user, per-day task status rows.
    task_statuses (user_id, template_id, date) {
        /// Owning user.
        user_id -> Uuid,
        /// Template the row was generated from.
        template_id -> Uuid,
        /// Covered calendar day.
        date -> Date,
        /// Completion state.
        #[max_length = 20]
        status -> Varchar,
    }
}

diesel::joinable!(task_templates -> challenges (challenge_id));
diesel::joinable!(task_statuses -> task_templates (template_id));

diesel::allow_tables_to_appear_in_same_query!(
    challenges,
    challenge_members,
    challenge_invitations,
    task_templates,
    task_statuses,
);
