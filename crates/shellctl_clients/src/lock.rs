//! Cross-agent task lock on top of the execution protocol.
//!
//! Agents share nothing but the lock table. Acquisition is a conditional
//! update followed by a read of the holder; contention is an ordinary
//! `Ok(false)`, and callers that want to wait use [`TaskLocker::acquire`]
//! with a [`RetryPolicy`]. There is no expiry: a crashed holder keeps the
//! lock until someone calls [`TaskLocker::force_release`].

use crate::error::{ClientError, Result};
use serde_json::Value;
use shellctl_builders::{CharmLockingQueryBuilder, LockTask, QueryQuoter, StringQueryQuoter};
use shellctl_executor::{Executor, DEFAULT_TIMEOUT};
use shellctl_protocol::config::LockingConfig;
use shellctl_protocol::defaults::{
    DEFAULT_LOCK_INITIAL_BACKOFF_MS, DEFAULT_LOCK_MAX_ATTEMPTS, DEFAULT_LOCK_MAX_BACKOFF_MS,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Capped exponential backoff between acquisition attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_LOCK_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_LOCK_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_LOCK_MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// A single attempt.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &LockingConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// Wait after the failed attempt number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

pub struct TaskLocker<E, Q = StringQueryQuoter> {
    executor: E,
    builder: CharmLockingQueryBuilder<Q>,
    timeout: Duration,
}

impl<E: Executor> TaskLocker<E, StringQueryQuoter> {
    pub fn new(executor: E, schema: &str, table: &str) -> Self {
        Self::with_builder(executor, CharmLockingQueryBuilder::new(schema, table))
    }
}

impl<E: Executor, Q: QueryQuoter> TaskLocker<E, Q> {
    pub fn with_builder(executor: E, builder: CharmLockingQueryBuilder<Q>) -> Self {
        Self {
            executor,
            builder,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Per-statement timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Create the table and seed the task rows. Safe to repeat and to race.
    pub fn initialize(&self) -> Result<()> {
        self.executor
            .execute_sql(&self.builder.build_table_creation_query(), self.timeout)?;
        debug!("Lock table initialized");
        Ok(())
    }

    /// One acquisition attempt. `Ok(false)` means another agent holds it.
    pub fn try_acquire(&self, task: LockTask, executor_id: &str) -> Result<bool> {
        self.executor
            .execute_sql(&self.builder.build_acquire_query(task, executor_id), self.timeout)?;

        let holder = self.fetch_holder(task)?;
        let acquired = holder.as_deref() == Some(executor_id);
        if acquired {
            info!(task = %task, executor = executor_id, "Lock acquired");
        } else {
            debug!(
                task = %task,
                executor = executor_id,
                holder = holder.as_deref().unwrap_or("<none>"),
                "Lock busy"
            );
        }
        Ok(acquired)
    }

    /// Retry [`try_acquire`](Self::try_acquire) per `policy`, sleeping
    /// between attempts. `Ok(false)` once attempts run out.
    pub fn acquire(&self, task: LockTask, executor_id: &str, policy: &RetryPolicy) -> Result<bool> {
        let attempts = policy.max_attempts.max(1);
        for attempt in 0..attempts {
            if self.try_acquire(task, executor_id)? {
                return Ok(true);
            }
            if attempt + 1 < attempts {
                std::thread::sleep(policy.backoff(attempt));
            }
        }
        warn!(
            task = %task,
            executor = executor_id,
            attempts,
            "Gave up waiting for lock"
        );
        Ok(false)
    }

    pub fn fetch_holder(&self, task: LockTask) -> Result<Option<String>> {
        let rows = self
            .executor
            .execute_sql(&self.builder.build_fetch_acquired_query(task), self.timeout)?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        match row.get("executor") {
            Some(Value::String(holder)) => Ok(Some(holder.clone())),
            other => Err(ClientError::UnexpectedOutput(format!(
                "lock row for {} has executor {:?}",
                task, other
            ))),
        }
    }

    /// Release if `executor_id` holds the lock. `Ok(false)` when it did
    /// not, in which case the table is left alone.
    pub fn release(&self, task: LockTask, executor_id: &str) -> Result<bool> {
        let holder = self.fetch_holder(task)?;
        if holder.as_deref() != Some(executor_id) {
            debug!(
                task = %task,
                executor = executor_id,
                holder = holder.as_deref().unwrap_or("<none>"),
                "Release skipped, not the holder"
            );
            return Ok(false);
        }

        // The update re-checks the holder; another agent may have taken over.
        self.executor
            .execute_sql(&self.builder.build_release_query(task, executor_id), self.timeout)?;
        info!(task = %task, executor = executor_id, "Lock released");
        Ok(true)
    }

    /// Release regardless of holder.
    pub fn force_release(&self, task: LockTask) -> Result<()> {
        self.executor
            .execute_sql(&self.builder.build_force_release_query(task), self.timeout)?;
        warn!(task = %task, "Lock force-released");
        Ok(())
    }

    /// Run `f` while holding `task`. `Ok(None)` if the lock could not be
    /// taken. The lock is released afterwards, also when `f` panics.
    pub fn with_lock<T, F>(
        &self,
        task: LockTask,
        executor_id: &str,
        policy: &RetryPolicy,
        f: F,
    ) -> Result<Option<T>>
    where
        F: FnOnce() -> T,
    {
        if !self.acquire(task, executor_id, policy)? {
            return Ok(None);
        }

        let mut guard = ReleaseOnDrop {
            locker: self,
            task,
            executor_id,
            armed: true,
        };
        let out = f();
        guard.armed = false;

        if !self.release(task, executor_id)? {
            warn!(task = %task, executor = executor_id, "Lock was taken over while held");
        }
        Ok(Some(out))
    }
}

struct ReleaseOnDrop<'a, E: Executor, Q: QueryQuoter> {
    locker: &'a TaskLocker<E, Q>,
    task: LockTask,
    executor_id: &'a str,
    armed: bool,
}

impl<E: Executor, Q: QueryQuoter> Drop for ReleaseOnDrop<'_, E, Q> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.locker.release(self.task, self.executor_id) {
            warn!(task = %self.task, executor = self.executor_id, "Failed to release lock after panic: {}", e);
        }
    }
}
