//! In-memory integration tests for the receive, complete, and review flow.

use chrono::Duration;
use rstest::rstest;
use taskmarket::{
    config::LifecycleConfig,
    user_task::{
        domain::{StaffRole, StaffUser, TaskId, UserTaskDomainError, UserTaskId, UserTaskStatus},
        services::UserTaskLifecycleError,
    },
};

use super::helpers::{
    Marketplace, channel, configured_marketplace, end_user, limits, marketplace,
};

/// Reloads a task and returns `(left, completed, accepted)`.
async fn counters(market: &Marketplace, task_id: TaskId) -> Result<(u64, u64, u64), eyre::Report> {
    let task = market
        .lifecycle
        .find_task(task_id)
        .await?
        .ok_or_else(|| eyre::eyre!("task {task_id} should exist"))?;
    Ok((
        task.left_amount(),
        task.completed_amount(),
        task.accepted_amount(),
    ))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn accepted_user_task_moves_every_counter(
    marketplace: Marketplace,
) -> Result<(), eyre::Report> {
    let market = marketplace;
    let reviewer = market.hire_reviewer("mira").await;
    let task = market.publish(25, 3, limits(0, 0, Some(3600))).await;

    let received = market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await?;
    eyre::ensure!(received.status() == UserTaskStatus::Received, "fresh user task should be received");
    eyre::ensure!(counters(&market, task.id()).await? == (2, 0, 0), "receive should consume one slot");

    market.clock.advance(Duration::minutes(30));
    let completed = market.lifecycle.complete_by_id(received.id()).await?;
    let completed_at = completed
        .completed_at()
        .ok_or_else(|| eyre::eyre!("completion time missing"))?;
    eyre::ensure!(completed.status() == UserTaskStatus::Completed, "user task should be completed");
    eyre::ensure!(completed.review_end_at() == Some(completed_at + Duration::seconds(3600)), "review deadline should be one review period after completion");
    eyre::ensure!(completed.reviewer_user_id() == Some(reviewer.id()), "active reviewer should be assigned");
    eyre::ensure!(counters(&market, task.id()).await? == (2, 1, 0), "completion should be counted");

    let reviewed = market
        .lifecycle
        .review_by_id(&reviewer, received.id(), UserTaskStatus::Accepted)
        .await?;
    eyre::ensure!(reviewed.status() == UserTaskStatus::Accepted, "user task should be accepted");
    eyre::ensure!(reviewed.reviewed_at().is_some(), "review time should be recorded");
    eyre::ensure!(counters(&market, task.id()).await? == (2, 1, 1), "acceptance should be counted");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejection_leaves_acceptance_counter_alone(
    marketplace: Marketplace,
) -> Result<(), eyre::Report> {
    let market = marketplace;
    let task = market.publish(25, 3, limits(0, 0, None)).await;
    let received = market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await?;
    let completed = market.lifecycle.complete_by_id(received.id()).await?;
    eyre::ensure!(
        completed.reviewer_user_id().is_none(),
        "no reviewer is on staff yet"
    );

    let staff = StaffUser::new("duty-lead", StaffRole::Administrator);
    let rejected = market
        .lifecycle
        .review_by_id(&staff, received.id(), UserTaskStatus::Rejected)
        .await?;

    eyre::ensure!(rejected.status() == UserTaskStatus::Rejected, "user task should be rejected");
    eyre::ensure!(rejected.reviewer_user_id() == Some(staff.id()), "reviewing staff should be recorded");
    eyre::ensure!(
        counters(&market, task.id()).await? == (2, 1, 0),
        "rejection should not count as acceptance"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn per_person_limit_is_enforced_per_channel(marketplace: Marketplace) {
    let market = marketplace;
    let task = market.publish(5, 10, limits(1, 0, None)).await;
    market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await
        .expect("first receive should succeed");

    let again = market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await;
    let other_channel = market
        .lifecycle
        .receive_for(task.id(), channel(8), end_user("ana"))
        .await;

    let err = again.expect_err("second receive should be refused");
    assert!(err.is_recoverable());
    assert!(matches!(
        err,
        UserTaskLifecycleError::Domain(UserTaskDomainError::LimitExceeded { limit: 1 })
    ));
    assert!(other_channel.is_ok());
    let held = market
        .lifecycle
        .count(channel(7), &end_user("ana"), task.id())
        .await
        .expect("count should succeed");
    assert_eq!(held, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cooldown_opens_after_recycle_days(marketplace: Marketplace) {
    let market = marketplace;
    let task = market.publish(5, 10, limits(0, 7, None)).await;
    let first = market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await
        .expect("first receive should succeed");

    market.clock.advance(Duration::days(3));
    let early = market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await;
    assert!(matches!(
        early,
        Err(UserTaskLifecycleError::Domain(
            UserTaskDomainError::CooldownActive {
                recycle_days: 7,
                elapsed_days: 3,
            }
        ))
    ));

    market.clock.advance(Duration::days(4));
    let second = market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await
        .expect("receive after the cooldown should succeed");
    let latest = market
        .lifecycle
        .find_latest(channel(7), &end_user("ana"), task.id())
        .await
        .expect("lookup should succeed");

    assert_ne!(first.id(), second.id());
    assert_eq!(latest.map(|user_task| user_task.id()), Some(second.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn exhausted_campaign_refuses_new_receives(marketplace: Marketplace) {
    let market = marketplace;
    let task = market.publish(5, 1, limits(0, 0, None)).await;
    market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await
        .expect("only slot should be taken");

    let result = market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ben"))
        .await;

    assert!(matches!(
        result,
        Err(UserTaskLifecycleError::Domain(UserTaskDomainError::CapacityExhausted(id))) if id == task.id()
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn configured_reviewer_role_is_assigned_on_completion() -> Result<(), eyre::Report> {
    let market = configured_marketplace(LifecycleConfig {
        reviewer_role: StaffRole::Administrator,
        ..LifecycleConfig::default()
    });
    market.hire_reviewer("mira").await;
    let admin = market.hire("root", StaffRole::Administrator).await;
    let task = market.publish(5, 4, limits(0, 0, Some(600))).await;

    for name in ["ana", "ben", "cai"] {
        let received = market
            .lifecycle
            .receive_for(task.id(), channel(7), end_user(name))
            .await?;
        let completed = market.lifecycle.complete_by_id(received.id()).await?;
        eyre::ensure!(
            completed.reviewer_user_id() == Some(admin.id()),
            "only the configured role should be assigned reviews"
        );
    }
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn review_requires_a_completed_user_task(marketplace: Marketplace) {
    let market = marketplace;
    let reviewer = market.hire_reviewer("mira").await;
    let task = market.publish(5, 2, limits(0, 0, None)).await;
    let received = market
        .lifecycle
        .receive_for(task.id(), channel(7), end_user("ana"))
        .await
        .expect("receive should succeed");

    let result = market
        .lifecycle
        .review_by_id(&reviewer, received.id(), UserTaskStatus::Accepted)
        .await;

    assert!(matches!(
        result,
        Err(UserTaskLifecycleError::Domain(
            UserTaskDomainError::InvalidTransition {
                from: UserTaskStatus::Received,
                to: UserTaskStatus::Accepted,
            }
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_identifiers_are_reported(marketplace: Marketplace) {
    let market = marketplace;
    let missing_task = TaskId::new();
    let missing_user_task = UserTaskId::new();

    let receive = market
        .lifecycle
        .receive_for(missing_task, channel(7), end_user("ana"))
        .await;
    let complete = market.lifecycle.complete_by_id(missing_user_task).await;

    assert!(matches!(
        receive,
        Err(UserTaskLifecycleError::TaskNotFound(id)) if id == missing_task
    ));
    assert!(matches!(
        complete,
        Err(UserTaskLifecycleError::UserTaskNotFound(id)) if id == missing_user_task
    ));
}
