//! shellctl Test Utilities
//!
//! # Features
//!
//! - `mysql-tests`: Enable tests that need a reachable MySQL server and a real
//!   `mysqlsh` (see [`LiveShellConfig`])
//!
//! # Usage
//!
//! ```rust,ignore
//! use shellctl_test_utils::{FakeShell, Reply};
//!
//! let shell = FakeShell::builder()
//!     .password("pw")
//!     .on_sql("SELECT 1", Reply::rows(json!([{"1": 1}])))
//!     .build()
//!     .unwrap();
//! let executor = LocalExecutor::new(details, shell.path());
//! ```

pub mod fake_shell;
pub mod live;
pub mod scripted;

pub use fake_shell::{FakeShell, Invocation, Reply};
pub use live::LiveShellConfig;
pub use scripted::{rows_from_json, Call, Response, ScriptedExecutor};
