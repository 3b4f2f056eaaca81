//! Canonical default values shared by the executor, clients and CLI.

/// Management shell binary looked up on PATH when no path is configured.
pub const DEFAULT_SHELL_PATH: &str = "mysqlsh";

/// Per-call budget for one management shell process.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Schema holding the task lock table.
pub const DEFAULT_LOCK_SCHEMA: &str = "mysql";

/// Name of the task lock table.
pub const DEFAULT_LOCK_TABLE: &str = "locking";

/// Host pattern used for roles and users created without an explicit host.
pub const DEFAULT_ACCOUNT_HOST: &str = "%";

pub const DEFAULT_LOCK_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_LOCK_INITIAL_BACKOFF_MS: u64 = 500;
pub const DEFAULT_LOCK_MAX_BACKOFF_MS: u64 = 10_000;
