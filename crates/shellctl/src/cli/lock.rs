//! `shellctl lock`: drive the task lock table by hand.

use crate::cli::context::Session;
use crate::cli::output::print_table;
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use shellctl_builders::LockTask;
use shellctl_clients::{RetryPolicy, TaskLocker};
use shellctl_executor::LocalExecutor;

#[derive(Subcommand, Debug, Clone)]
pub enum LockAction {
    /// Create the lock table and seed one row per task (idempotent)
    Init,
    /// Take a task lock; exits non-zero if someone else holds it
    Acquire {
        #[arg(value_parser = parse_task)]
        task: LockTask,
        /// Holder identity [default: `executor_id` under [locking]]
        #[arg(long)]
        executor_id: Option<String>,
        /// Retry with backoff per the [locking] policy before giving up
        #[arg(long)]
        wait: bool,
    },
    /// Release a task lock held by this executor
    Release {
        #[arg(value_parser = parse_task)]
        task: LockTask,
        #[arg(long)]
        executor_id: Option<String>,
    },
    /// Show who holds a task lock, or every task's holder
    Holder {
        #[arg(value_parser = parse_task)]
        task: Option<LockTask>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Release a task lock whoever holds it
    ForceRelease {
        #[arg(value_parser = parse_task)]
        task: LockTask,
    },
}

pub fn parse_task(s: &str) -> std::result::Result<LockTask, String> {
    LockTask::parse(s).ok_or_else(|| {
        let known: Vec<&str> = LockTask::ALL.iter().map(LockTask::as_str).collect();
        format!("unknown task '{}'; expected one of: {}", s, known.join(", "))
    })
}

fn locker(session: &Session) -> TaskLocker<LocalExecutor> {
    let locking = &session.config.locking;
    TaskLocker::new(session.executor(), &locking.schema, &locking.table)
        .with_timeout(session.timeout)
}

fn executor_id(session: &Session, flag: Option<String>) -> Result<String> {
    match flag.or_else(|| session.config.locking.executor_id.clone()) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => bail!("No executor id; pass --executor-id or set `executor_id` under [locking]"),
    }
}

pub fn run(action: LockAction, session: &Session) -> Result<()> {
    let locker = locker(session);

    match action {
        LockAction::Init => {
            locker.initialize().context("Failed to initialize lock table")?;
            println!(
                "Lock table {}.{} ready",
                session.config.locking.schema, session.config.locking.table
            );
        }
        LockAction::Acquire {
            task,
            executor_id: flag,
            wait,
        } => {
            let id = executor_id(session, flag)?;
            let policy = if wait {
                RetryPolicy::from_config(&session.config.locking)
            } else {
                RetryPolicy::once()
            };
            let acquired = locker
                .acquire(task, &id, &policy)
                .with_context(|| format!("Failed to acquire lock {}", task))?;
            if !acquired {
                let holder = locker.fetch_holder(task)?;
                bail!(
                    "Lock {} is held by {}",
                    task,
                    holder.as_deref().unwrap_or("an unknown executor")
                );
            }
            println!("Acquired {} as {}", task, id);
        }
        LockAction::Release {
            task,
            executor_id: flag,
        } => {
            let id = executor_id(session, flag)?;
            let released = locker
                .release(task, &id)
                .with_context(|| format!("Failed to release lock {}", task))?;
            if released {
                println!("Released {} as {}", task, id);
            } else {
                println!("{} is not held by {}, nothing to release", task, id);
            }
        }
        LockAction::Holder { task, json } => {
            let tasks = match task {
                Some(task) => vec![task],
                None => LockTask::ALL.to_vec(),
            };
            let mut holders = Vec::with_capacity(tasks.len());
            for task in tasks {
                holders.push((task, locker.fetch_holder(task)?));
            }

            if json {
                let value: serde_json::Map<String, serde_json::Value> = holders
                    .into_iter()
                    .map(|(task, holder)| (task.to_string(), holder.into()))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let rows = holders
                    .into_iter()
                    .map(|(task, holder)| {
                        vec![task.to_string(), holder.unwrap_or_else(|| "-".to_string())]
                    })
                    .collect();
                print_table(&["TASK", "HOLDER"], rows);
            }
        }
        LockAction::ForceRelease { task } => {
            locker
                .force_release(task)
                .with_context(|| format!("Failed to force-release lock {}", task))?;
            println!("Force-released {}", task);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task() {
        assert_eq!(
            parse_task("instance-rejoin").unwrap(),
            LockTask::InstanceRejoin
        );
        let err = parse_task("unit-teardown").unwrap_err();
        assert!(err.contains("unit-teardown"));
        assert!(err.contains("credential-rotation"));
    }
}
