//! Role provisioning statements.
//!
//! The instance roles form a hierarchy: `stats` < `reader` < `writer` < `ddl`
//! < `admin`, with `backup` granted to `admin` alongside. Roles carry no data
//! access of their own below `ddl`; operators grant schema access to
//! `reader`/`writer` per database.

use crate::quoting::{account, QueryQuoter, StringQueryQuoter};
use shellctl_protocol::defaults::DEFAULT_ACCOUNT_HOST;

const STATS_PRIVILEGES: &str = "PROCESS, REPLICATION CLIENT";
const BACKUP_PRIVILEGES: &str = "BACKUP_ADMIN, LOCK TABLES, PROCESS, RELOAD, REPLICATION CLIENT";
const DDL_PRIVILEGES: &str = "ALTER, ALTER ROUTINE, CREATE, CREATE ROUTINE, CREATE VIEW, DROP, \
     EVENT, INDEX, REFERENCES, SHOW VIEW, TRIGGER";
const DATABASE_ADMIN_PRIVILEGES: &str = "SELECT, INSERT, UPDATE, DELETE, EXECUTE, ALTER, \
     ALTER ROUTINE, CREATE, CREATE ROUTINE, CREATE TEMPORARY TABLES, CREATE VIEW, DROP, EVENT, \
     INDEX, LOCK TABLES, REFERENCES, SHOW VIEW, TRIGGER";

/// Names of the six instance roles.
#[derive(Debug, Clone)]
pub struct CharmAuthorizationQueryBuilder<Q = StringQueryQuoter> {
    pub role_admin: String,
    pub role_backup: String,
    pub role_ddl: String,
    pub role_stats: String,
    pub role_reader: String,
    pub role_writer: String,
    quoter: Q,
}

impl CharmAuthorizationQueryBuilder<StringQueryQuoter> {
    pub fn new(
        role_admin: impl Into<String>,
        role_backup: impl Into<String>,
        role_ddl: impl Into<String>,
        role_stats: impl Into<String>,
        role_reader: impl Into<String>,
        role_writer: impl Into<String>,
    ) -> Self {
        Self {
            role_admin: role_admin.into(),
            role_backup: role_backup.into(),
            role_ddl: role_ddl.into(),
            role_stats: role_stats.into(),
            role_reader: role_reader.into(),
            role_writer: role_writer.into(),
            quoter: StringQueryQuoter,
        }
    }
}

impl<Q: QueryQuoter> CharmAuthorizationQueryBuilder<Q> {
    pub fn with_quoter<R: QueryQuoter>(self, quoter: R) -> CharmAuthorizationQueryBuilder<R> {
        CharmAuthorizationQueryBuilder {
            role_admin: self.role_admin,
            role_backup: self.role_backup,
            role_ddl: self.role_ddl,
            role_stats: self.role_stats,
            role_reader: self.role_reader,
            role_writer: self.role_writer,
            quoter,
        }
    }

    fn role(&self, name: &str) -> String {
        account(&self.quoter, name, DEFAULT_ACCOUNT_HOST)
    }

    /// Create the instance roles and wire the hierarchy.
    pub fn build_instance_auth_roles_query(&self) -> String {
        let admin = self.role(&self.role_admin);
        let backup = self.role(&self.role_backup);
        let ddl = self.role(&self.role_ddl);
        let stats = self.role(&self.role_stats);
        let reader = self.role(&self.role_reader);
        let writer = self.role(&self.role_writer);

        let statements = [
            format!(
                "CREATE ROLE IF NOT EXISTS {}, {}, {}, {}, {}, {}",
                admin, backup, ddl, stats, reader, writer
            ),
            format!("GRANT {} ON *.* TO {}", STATS_PRIVILEGES, stats),
            format!("GRANT SELECT ON performance_schema.* TO {}", stats),
            format!("GRANT {} TO {}", stats, reader),
            format!("GRANT {} TO {}", reader, writer),
            format!("GRANT {} ON *.* TO {}", DDL_PRIVILEGES, ddl),
            format!("GRANT {} TO {}", writer, ddl),
            format!("GRANT {} ON *.* TO {}", BACKUP_PRIVILEGES, backup),
            format!("GRANT SELECT ON performance_schema.log_status TO {}", backup),
            format!("GRANT ALL ON *.* TO {} WITH GRANT OPTION", admin),
            format!("GRANT {}, {} TO {}", ddl, backup, admin),
        ];
        statements.join("; ")
    }

    /// Create `role` with full rights on `database` only.
    pub fn build_database_admin_role_query(&self, role: &str, database: &str) -> String {
        let role = self.role(role);
        [
            format!("CREATE ROLE IF NOT EXISTS {}", role),
            format!(
                "GRANT {} ON {}.* TO {}",
                DATABASE_ADMIN_PRIVILEGES,
                self.quoter.quote_identifier(database),
                role
            ),
        ]
        .join("; ")
    }
}
