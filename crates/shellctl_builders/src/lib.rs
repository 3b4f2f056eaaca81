//! SQL quoting and statement builders.
//!
//! Builders are pure: typed parameters in, statement text out. Every value
//! or identifier that comes from a caller goes through a [`QueryQuoter`].

pub mod authorization;
pub mod locking;
pub mod logging;
pub mod quoting;

pub use authorization::CharmAuthorizationQueryBuilder;
pub use locking::{CharmLockingQueryBuilder, LockStatus, LockTask};
pub use logging::CharmLoggingQueryBuilder;
pub use quoting::{QueryQuoter, StringQueryQuoter};
