//! Diesel schema for lifecycle persistence.

diesel::table! {
    /// Task campaigns and their capacity counters.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Display title.
        #[max_length = 255]
        title -> Varchar,
        /// Flow credited per accepted instance.
        flow -> Int8,
        /// Slots the campaign started with.
        total_amount -> Int8,
        /// Per-person receive limit (0 = unlimited).
        each_person_limit -> Int4,
        /// Cooldown in days (0 = none).
        recycle_days_limit -> Int4,
        /// Review period in seconds.
        review_period -> Nullable<Int8>,
        /// Remaining receivable slots.
        left_amount -> Int8,
        /// Completions recorded.
        completed_amount -> Int8,
        /// Acceptances recorded.
        accepted_amount -> Int8,
        /// Optimistic-concurrency version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// End users' instances of tasks.
    user_tasks (id) {
        /// User task identifier.
        id -> Uuid,
        /// App channel.
        app_id -> Int8,
        /// End user within the channel.
        #[max_length = 255]
        app_user_id -> Varchar,
        /// Task campaign.
        task_id -> Uuid,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Receive timestamp.
        created_at -> Timestamptz,
        /// Completion timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Review deadline.
        review_end_at -> Nullable<Timestamptz>,
        /// Assigned reviewer.
        reviewer_user_id -> Nullable<Uuid>,
        /// Review timestamp.
        reviewed_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only audit records of user-task transitions.
    user_task_logs (id) {
        /// Insertion order.
        seq -> Int8,
        /// Log identifier.
        id -> Uuid,
        /// User task the transition applied to.
        user_task_id -> Uuid,
        /// Task campaign of the user task.
        task_id -> Uuid,
        /// End-user actor channel.
        operator_app_id -> Nullable<Int8>,
        /// End-user actor identifier.
        #[max_length = 255]
        operator_app_user_id -> Nullable<Varchar>,
        /// Staff actor identifier.
        operator_user_id -> Nullable<Uuid>,
        /// Transition timestamp.
        created_at -> Timestamptz,
        /// Status before the transition.
        #[max_length = 50]
        from_status -> Varchar,
        /// Status after the transition.
        #[max_length = 50]
        to_status -> Varchar,
    }
}

diesel::table! {
    /// Staff accounts.
    staff_users (id) {
        /// Staff identifier.
        id -> Uuid,
        /// Display name.
        #[max_length = 255]
        name -> Varchar,
        /// Role.
        #[max_length = 50]
        role -> Varchar,
        /// Account status.
        #[max_length = 50]
        status -> Varchar,
    }
}

diesel::joinable!(user_tasks -> tasks (task_id));
diesel::joinable!(user_task_logs -> user_tasks (user_task_id));

diesel::allow_tables_to_appear_in_same_query!(tasks, user_tasks, user_task_logs, staff_users);
