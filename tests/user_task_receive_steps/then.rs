//! Then steps for user-task receive BDD scenarios.

use super::world::{ReceiveWorld, run_async};
use rstest_bdd_macros::then;
use taskmarket::user_task::{
    domain::{UserTask, UserTaskDomainError, UserTaskStatus},
    services::UserTaskLifecycleError,
};

fn last_result(
    world: &ReceiveWorld,
) -> Result<&Result<UserTask, UserTaskLifecycleError>, eyre::Report> {
    world
        .last_receive_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing receive result"))
}

fn domain_error(world: &ReceiveWorld) -> Result<&UserTaskDomainError, eyre::Report> {
    match last_result(world)? {
        Err(UserTaskLifecycleError::Domain(err)) => Ok(err),
        other => Err(eyre::eyre!("expected a domain error, got {other:?}")),
    }
}

#[then("the receive succeeds")]
fn receive_succeeds(world: &ReceiveWorld) -> Result<(), eyre::Report> {
    match last_result(world)? {
        Ok(user_task) if user_task.status() == UserTaskStatus::Received => Ok(()),
        other => Err(eyre::eyre!("expected a received user task, got {other:?}")),
    }
}

#[then("the remaining capacity is {left:u64}")]
fn remaining_capacity(world: &ReceiveWorld, left: u64) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let task = run_async(world.service.find_task(task_id))?
        .ok_or_else(|| eyre::eyre!("task {task_id} vanished"))?;
    eyre::ensure!(
        task.left_amount() == left,
        "expected {left} slot(s) left, found {}",
        task.left_amount()
    );
    Ok(())
}

#[then("the receive fails because the limit is reached")]
fn fails_on_limit(world: &ReceiveWorld) -> Result<(), eyre::Report> {
    let err = domain_error(world)?;
    eyre::ensure!(
        matches!(err, UserTaskDomainError::LimitExceeded { .. }),
        "expected LimitExceeded, got {err:?}"
    );
    Ok(())
}

#[then("the receive fails because the cooldown is active")]
fn fails_on_cooldown(world: &ReceiveWorld) -> Result<(), eyre::Report> {
    let err = domain_error(world)?;
    eyre::ensure!(
        matches!(err, UserTaskDomainError::CooldownActive { .. }),
        "expected CooldownActive, got {err:?}"
    );
    Ok(())
}

#[then("the receive fails because capacity is exhausted")]
fn fails_on_capacity(world: &ReceiveWorld) -> Result<(), eyre::Report> {
    let err = domain_error(world)?;
    eyre::ensure!(
        matches!(err, UserTaskDomainError::CapacityExhausted(_)),
        "expected CapacityExhausted, got {err:?}"
    );
    Ok(())
}
