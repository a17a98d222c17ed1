//! Commit atomicity and optimistic guards against a real database.

use std::sync::Arc;

use rstest::rstest;
use taskmarket::{
    config::LifecycleConfig,
    user_task::{
        adapters::{
            StaffReviewerPicker,
            postgres::{PostgresStaffRepository, PostgresUserTaskStore},
        },
        domain::{
            Operator, StaffRole, StaffUser, Task, UserTask, UserTaskDomainError, UserTaskLog,
            UserTaskStatus,
        },
        ports::{
            RepositoryError, StaffRepository, TaskRepository, TransitionCommit,
            UserTaskRepository,
        },
        services::{AuditTrailService, UserTaskLifecycleError, UserTaskLifecycleService},
    },
};

use crate::postgres::helpers::{
    BoxError, PinnedClock, PostgresContext, at, channel, context, end_user, open_limits,
};

type PostgresLifecycle = UserTaskLifecycleService<
    PostgresUserTaskStore,
    StaffReviewerPicker<PostgresStaffRepository>,
    PinnedClock,
>;

fn lifecycle(context: &PostgresContext, config: LifecycleConfig) -> PostgresLifecycle {
    let picker = StaffReviewerPicker::from_config(Arc::clone(&context.staff), &config);
    UserTaskLifecycleService::new(
        Arc::clone(&context.store),
        Arc::new(picker),
        Arc::new(PinnedClock(at(5))),
    )
    .with_config(config)
}

fn receive_commit(task: &Task, name: &str) -> TransitionCommit {
    let user_task = UserTask::receive(channel(7), end_user(name), task.id(), at(1));
    let log = UserTaskLog::record(
        &user_task,
        Operator::end_user_of(&user_task),
        at(1),
        UserTaskStatus::Received,
        UserTaskStatus::Received,
    );
    let mut updated = task.clone();
    updated.take_slot().expect("slot available");
    TransitionCommit::insert(user_task, log).with_task(updated, task.version())
}

fn review_commit(
    completed: &UserTask,
    outcome: UserTaskStatus,
    reviewer: &StaffUser,
) -> TransitionCommit {
    let mut reviewed = completed.clone();
    reviewed
        .review(outcome, reviewer.id(), at(30))
        .expect("review allowed");
    let log = UserTaskLog::record(
        &reviewed,
        Operator::Staff {
            user_id: reviewer.id(),
        },
        at(30),
        UserTaskStatus::Completed,
        outcome,
    );
    TransitionCommit::update(reviewed, UserTaskStatus::Completed, log)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_version_commit_leaves_no_rows(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let store = ctx.store.as_ref();
    let task = Task::new("Follow us", 1, 3, open_limits(None), &PinnedClock(at(0)));
    store.store(&task).await?;
    store.commit(&receive_commit(&task, "u-1")).await?;

    let stale = receive_commit(&task, "u-2");
    let result = store.commit(&stale).await;

    assert!(matches!(
        result,
        Err(RepositoryError::StaleTask {
            expected_version: 0,
            ..
        })
    ));
    let missing = UserTaskRepository::find_by_id(store, stale.user_task.id()).await?;
    assert!(missing.is_none());
    assert!(store.logs_for_user_task(stale.user_task.id()).await?.is_empty());
    assert_eq!(store.logs_for_task(task.id()).await?.len(), 1);
    let stored = TaskRepository::find_by_id(store, task.id())
        .await?
        .expect("task exists");
    assert_eq!((stored.left_amount(), stored.version()), (2, 1));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_user_task_guard_rolls_back_task_update(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let store = ctx.store.as_ref();
    let task = Task::new("Follow us", 1, 3, open_limits(None), &PinnedClock(at(0)));
    store.store(&task).await?;
    let inserted = receive_commit(&task, "u-1");
    store.commit(&inserted).await?;
    let reloaded = TaskRepository::find_by_id(store, task.id())
        .await?
        .expect("task exists");

    // Claims the user task is completed while it is still received.
    let reviewer = StaffUser::new("rev", StaffRole::TaskReviewer);
    let mut pretend_completed = inserted.user_task.clone();
    pretend_completed
        .complete(at(2), at(3), Some(reviewer.id()))
        .expect("completion allowed");
    let mut accepted_task = reloaded.clone();
    accepted_task.record_completion().expect("completion counted");
    accepted_task.record_acceptance().expect("acceptance counted");
    let commit = review_commit(&pretend_completed, UserTaskStatus::Accepted, &reviewer)
        .with_task(accepted_task, reloaded.version());

    let result = store.commit(&commit).await;

    assert!(matches!(
        result,
        Err(RepositoryError::StaleUserTask {
            expected_status: UserTaskStatus::Completed,
            ..
        })
    ));
    let after = TaskRepository::find_by_id(store, task.id())
        .await?
        .expect("task exists");
    assert_eq!(after, reloaded);
    assert_eq!(store.logs_for_user_task(inserted.user_task.id()).await?.len(), 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn competing_reviews_admit_one_outcome(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let first = StaffUser::new("mira", StaffRole::TaskReviewer);
    let second = StaffUser::new("otto", StaffRole::TaskReviewer);
    ctx.staff.store(&first).await?;
    ctx.staff.store(&second).await?;
    let service = lifecycle(&ctx, LifecycleConfig::default());
    let task = Task::new("Share", 6, 2, open_limits(Some(600)), &PinnedClock(at(0)));
    ctx.store.store(&task).await?;
    let received = service
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await?;
    let completed = service.complete_by_id(received.id()).await?;
    let assigned = completed.reviewer_user_id();
    assert!(assigned == Some(first.id()) || assigned == Some(second.id()));

    let accept = review_commit(&completed, UserTaskStatus::Accepted, &first);
    let reject = review_commit(&completed, UserTaskStatus::Rejected, &second);
    let (accepted, rejected) = tokio::join!(ctx.store.commit(&accept), ctx.store.commit(&reject));

    let outcomes = [&accepted, &rejected];
    assert_eq!(outcomes.iter().filter(|result| result.is_ok()).count(), 1);
    let loser = outcomes
        .iter()
        .find_map(|result| result.as_ref().err())
        .expect("one commit loses");
    assert!(loser.is_stale(), "unexpected error: {loser}");
    let winner = if accepted.is_ok() {
        UserTaskStatus::Accepted
    } else {
        UserTaskStatus::Rejected
    };
    let stored = UserTaskRepository::find_by_id(ctx.store.as_ref(), completed.id())
        .await?
        .expect("user task exists");
    assert_eq!(stored.status(), winner);
    let history = ctx.store.logs_for_user_task(completed.id()).await?;
    let statuses: Vec<_> = history.iter().map(UserTaskLog::to_status).collect();
    assert_eq!(
        statuses,
        [UserTaskStatus::Received, UserTaskStatus::Completed, winner]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_receives_never_oversell(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let service = Arc::new(lifecycle(
        &ctx,
        LifecycleConfig {
            max_commit_attempts: 20,
            ..LifecycleConfig::default()
        },
    ));
    let task = Task::new("Follow us", 2, 3, open_limits(None), &PinnedClock(at(0)));
    ctx.store.store(&task).await?;

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let racer = Arc::clone(&service);
            let task_id = task.id();
            tokio::spawn(async move {
                racer
                    .receive_for(task_id, channel(7), end_user(&format!("user-{index}")))
                    .await
            })
        })
        .collect();
    let mut received = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => received += 1,
            Err(UserTaskLifecycleError::Domain(UserTaskDomainError::CapacityExhausted(id))) => {
                assert_eq!(id, task.id());
            }
            Err(other) => return Err(Box::new(other) as BoxError),
        }
    }

    assert_eq!(received, 3);
    let stored = TaskRepository::find_by_id(ctx.store.as_ref(), task.id())
        .await?
        .expect("task exists");
    assert_eq!(stored.left_amount(), 0);
    let audit = AuditTrailService::new(Arc::clone(&ctx.store));
    let reconciliation = audit.reconcile(task.id()).await?;
    assert!(reconciliation.is_consistent(), "{reconciliation:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn latest_user_task_breaks_timestamp_ties_by_id(
    #[future] context: Result<Option<PostgresContext>, BoxError>,
) -> Result<(), BoxError> {
    let Some(ctx) = context.await? else {
        return Ok(());
    };
    let store = ctx.store.as_ref();
    let task = Task::new("Follow us", 1, 5, open_limits(None), &PinnedClock(at(0)));
    store.store(&task).await?;
    let mut ids = Vec::new();
    for _ in 0..4 {
        let user_task = UserTask::receive(channel(7), end_user("ana"), task.id(), at(1));
        let log = UserTaskLog::record(
            &user_task,
            Operator::end_user_of(&user_task),
            at(1),
            UserTaskStatus::Received,
            UserTaskStatus::Received,
        );
        ids.push(user_task.id());
        store.commit(&TransitionCommit::insert(user_task, log)).await?;
    }

    let latest = store
        .find_latest_by_channel_user_task(channel(7), &end_user("ana"), task.id())
        .await?
        .expect("user task exists");

    assert_eq!(Some(latest.id()), ids.iter().copied().max());
    assert_eq!(
        store
            .count_by_channel_user_task(channel(7), &end_user("ana"), task.id())
            .await?,
        4
    );
    Ok(())
}
