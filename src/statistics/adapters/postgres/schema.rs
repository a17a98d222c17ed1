//! Diesel schema for statistics snapshots.

diesel::table! {
    /// Task/app activity per collected window.
    task_app_statistics (task_id, app_id, window_begin, window_end) {
        /// Task identifier.
        task_id -> Uuid,
        /// App channel.
        app_id -> Int8,
        /// Inclusive window start.
        window_begin -> Timestamptz,
        /// Exclusive window end.
        window_end -> Timestamptz,
        /// Receives in the window.
        received_amount -> Int8,
        /// Completions in the window.
        completed_amount -> Int8,
        /// Accepted completions in the window.
        accepted_amount -> Int8,
        /// Flow summed over accepted completions.
        total_flow -> Int8,
    }
}

diesel::table! {
    /// Reviewer throughput per collected window.
    reviewer_task_statistics (reviewer_user_id, window_begin, window_end) {
        /// Staff account identifier.
        reviewer_user_id -> Uuid,
        /// Inclusive window start.
        window_begin -> Timestamptz,
        /// Exclusive window end.
        window_end -> Timestamptz,
        /// Accepting reviews.
        accepted_amount -> Int8,
        /// Reviews of any outcome.
        reviewed_amount -> Int8,
    }
}
