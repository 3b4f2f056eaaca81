//! Statements for the table-backed task lock.
//!
//! One row per known task, seeded at initialisation, so that every state
//! change afterwards is a conditional `UPDATE` on an existing row:
//!
//! ```text
//! not-started --acquire--> in-progress --release--> released --acquire--> ...
//! ```
//!
//! Acquire only matches a row that is not `in-progress`. The server applies
//! the update atomically per row, so when two agents race exactly one of
//! them changes it.

use crate::quoting::{QueryQuoter, StringQueryQuoter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operations that must not run concurrently across the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockTask {
    InstanceAddition,
    InstanceRemoval,
    InstanceRejoin,
    CredentialRotation,
}

impl LockTask {
    pub const ALL: [LockTask; 4] = [
        LockTask::InstanceAddition,
        LockTask::InstanceRemoval,
        LockTask::InstanceRejoin,
        LockTask::CredentialRotation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LockTask::InstanceAddition => "instance-addition",
            LockTask::InstanceRemoval => "instance-removal",
            LockTask::InstanceRejoin => "instance-rejoin",
            LockTask::CredentialRotation => "credential-rotation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|task| task.as_str() == s)
    }
}

impl fmt::Display for LockTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value of the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockStatus {
    /// Free, never held.
    NotStarted,
    /// Held by the row's `executor`.
    InProgress,
    /// Free, last held by the row's `executor`.
    Released,
}

impl LockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockStatus::NotStarted => "not-started",
            LockStatus::InProgress => "in-progress",
            LockStatus::Released => "released",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not-started" => Some(LockStatus::NotStarted),
            "in-progress" => Some(LockStatus::InProgress),
            "released" => Some(LockStatus::Released),
            _ => None,
        }
    }

    pub fn is_held(&self) -> bool {
        matches!(self, LockStatus::InProgress)
    }
}

impl fmt::Display for LockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Builds lock-table statements for `schema`.`table`.
#[derive(Debug, Clone)]
pub struct CharmLockingQueryBuilder<Q = StringQueryQuoter> {
    schema: String,
    table: String,
    quoter: Q,
}

impl CharmLockingQueryBuilder<StringQueryQuoter> {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self::with_quoter(schema, table, StringQueryQuoter)
    }
}

impl<Q: QueryQuoter> CharmLockingQueryBuilder<Q> {
    pub fn with_quoter(schema: impl Into<String>, table: impl Into<String>, quoter: Q) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            quoter,
        }
    }

    fn table_ref(&self) -> String {
        format!(
            "{}.{}",
            self.quoter.quote_identifier(&self.schema),
            self.quoter.quote_identifier(&self.table)
        )
    }

    fn value(&self, value: &str) -> String {
        self.quoter.quote_value(value)
    }

    /// Create the table if missing and seed one free row per known task.
    /// Existing rows keep their status, so running this while a lock is held
    /// (or from several agents at once) changes nothing.
    pub fn build_table_creation_query(&self) -> String {
        let table = self.table_ref();
        let seeds: Vec<String> = LockTask::ALL
            .iter()
            .map(|task| {
                format!(
                    "({}, NULL, {})",
                    self.value(task.as_str()),
                    self.value(LockStatus::NotStarted.as_str())
                )
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             task VARCHAR(64) NOT NULL PRIMARY KEY, \
             executor VARCHAR(255) NULL, \
             status VARCHAR(20) NOT NULL DEFAULT {default}\
             ); \
             INSERT INTO {table} (task, executor, status) VALUES {seeds} \
             ON DUPLICATE KEY UPDATE task = task",
            table = table,
            default = self.value(LockStatus::NotStarted.as_str()),
            seeds = seeds.join(", "),
        )
    }

    /// Take `task` for `executor` if nobody holds it. Zero affected rows
    /// means someone else does.
    pub fn build_acquire_query(&self, task: LockTask, executor: &str) -> String {
        format!(
            "UPDATE {} SET executor = {}, status = {} WHERE task = {} AND status <> {}",
            self.table_ref(),
            self.value(executor),
            self.value(LockStatus::InProgress.as_str()),
            self.value(task.as_str()),
            self.value(LockStatus::InProgress.as_str()),
        )
    }

    /// Current holder of `task`: one `executor` row, or none when free.
    pub fn build_fetch_acquired_query(&self, task: LockTask) -> String {
        format!(
            "SELECT executor FROM {} WHERE task = {} AND status = {}",
            self.table_ref(),
            self.value(task.as_str()),
            self.value(LockStatus::InProgress.as_str()),
        )
    }

    /// Free `task` if `executor` holds it; otherwise a no-op.
    pub fn build_release_query(&self, task: LockTask, executor: &str) -> String {
        format!(
            "UPDATE {} SET status = {} WHERE task = {} AND executor = {} AND status = {}",
            self.table_ref(),
            self.value(LockStatus::Released.as_str()),
            self.value(task.as_str()),
            self.value(executor),
            self.value(LockStatus::InProgress.as_str()),
        )
    }

    /// Free `task` whoever holds it. For clearing a lock left by a crashed
    /// agent.
    pub fn build_force_release_query(&self, task: LockTask) -> String {
        format!(
            "UPDATE {} SET status = {} WHERE task = {} AND status = {}",
            self.table_ref(),
            self.value(LockStatus::Released.as_str()),
            self.value(task.as_str()),
            self.value(LockStatus::InProgress.as_str()),
        )
    }
}
