//! Administrative operations on a single instance, in SQL.

use crate::error::{ClientError, Result};
use serde_json::Value;
use shellctl_builders::quoting::account;
use shellctl_builders::{CharmLoggingQueryBuilder, QueryQuoter, StringQueryQuoter};
use shellctl_executor::{Executor, Row, DEFAULT_TIMEOUT};
use shellctl_protocol::{InstanceRole, InstanceStatus, LogType, Role, User, VariableScope, VariableValue};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Predicate selecting role accounts in `mysql.user`: `CREATE ROLE` makes a
/// locked account with an expired, empty password.
const ROLE_PREDICATE: &str =
    "account_locked = 'Y' AND password_expired = 'Y' AND authentication_string = ''";

pub struct MySQLInstanceClient<E, Q = StringQueryQuoter> {
    executor: E,
    quoter: Q,
    timeout: Duration,
}

impl<E: Executor> MySQLInstanceClient<E, StringQueryQuoter> {
    pub fn new(executor: E) -> Self {
        Self::with_quoter(executor, StringQueryQuoter)
    }
}

impl<E: Executor, Q: QueryQuoter> MySQLInstanceClient<E, Q> {
    pub fn with_quoter(executor: E, quoter: Q) -> Self {
        Self {
            executor,
            quoter,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn sql(&self, statement: &str) -> Result<Vec<Row>> {
        Ok(self.executor.execute_sql(statement, self.timeout)?)
    }

    fn account(&self, name: &str, host: &str) -> String {
        account(&self.quoter, name, host)
    }

    fn grantees(&self, roles: &[&str]) -> String {
        roles
            .iter()
            .map(|r| self.quoter.quote_value(r))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Create `role`, optionally inheriting from `roles`.
    pub fn create_instance_role(&self, role: &Role, roles: &[&str]) -> Result<()> {
        let account = self.account(&role.name, &role.host);
        let mut statements = vec![format!("CREATE ROLE {}", account)];
        if !roles.is_empty() {
            statements.push(format!("GRANT {} TO {}", self.grantees(roles), account));
        }
        self.sql(&statements.join("; "))?;
        info!(role = %role.name, "Created instance role");
        Ok(())
    }

    /// Roles whose name matches the `LIKE` pattern.
    pub fn search_instance_roles(&self, pattern: &str) -> Result<Vec<Role>> {
        let query = format!(
            "SELECT User AS name, Host AS host FROM mysql.user WHERE {} AND User LIKE {}",
            ROLE_PREDICATE,
            self.quoter.quote_value(pattern)
        );
        self.sql(&query)?
            .iter()
            .map(|row| Ok(Role::with_host(string_field(row, "name")?, string_field(row, "host")?)))
            .collect()
    }

    /// Create `user` with `password`, its attributes, and `roles` granted.
    ///
    /// The password is part of the statement text, which the local executor
    /// passes on the shell's command line.
    pub fn create_instance_user(&self, user: &User, password: &str, roles: &[&str]) -> Result<()> {
        let account = self.account(&user.name, &user.host);
        let mut statements = vec![format!(
            "CREATE USER {} IDENTIFIED BY {} ATTRIBUTE {}",
            account,
            self.quoter.quote_value(password),
            self.quoter.quote_value(&user.serialize_attrs())
        )];
        if !roles.is_empty() {
            statements.push(format!("GRANT {} TO {}", self.grantees(roles), account));
        }
        self.sql(&statements.join("; "))?;
        info!(user = %user.name, "Created instance user");
        Ok(())
    }

    pub fn update_instance_user(&self, user: &User, password: &str) -> Result<()> {
        let statement = format!(
            "ALTER USER {} IDENTIFIED BY {}",
            self.account(&user.name, &user.host),
            self.quoter.quote_value(password)
        );
        self.sql(&statement)?;
        info!(user = %user.name, "Updated instance user password");
        Ok(())
    }

    pub fn delete_instance_user(&self, user: &User) -> Result<()> {
        self.delete_instance_users(std::slice::from_ref(user))
    }

    /// Drop every listed user in one statement; missing users are skipped.
    pub fn delete_instance_users(&self, users: &[User]) -> Result<()> {
        if users.is_empty() {
            return Ok(());
        }
        let accounts: Vec<String> = users.iter().map(|u| self.account(&u.name, &u.host)).collect();
        self.sql(&format!("DROP USER IF EXISTS {}", accounts.join(", ")))?;
        info!(count = users.len(), "Deleted instance users");
        Ok(())
    }

    /// Users (not roles) whose name matches the `LIKE` pattern and, when
    /// given, whose attributes contain every entry of `attributes`.
    pub fn search_instance_users(
        &self,
        pattern: &str,
        attributes: Option<&BTreeMap<String, String>>,
    ) -> Result<Vec<User>> {
        let mut query = format!(
            "SELECT User AS name, Host AS host, User_attributes AS attributes \
             FROM mysql.user WHERE NOT ({}) AND User LIKE {}",
            ROLE_PREDICATE,
            self.quoter.quote_value(pattern)
        );
        if let Some(attributes) = attributes {
            let wanted = serde_json::to_string(attributes)
                .map_err(|e| ClientError::UnexpectedOutput(e.to_string()))?;
            query.push_str(&format!(
                " AND JSON_CONTAINS(User_attributes->'$.metadata', {})",
                self.quoter.quote_value(&wanted)
            ));
        }

        self.sql(&query)?
            .iter()
            .map(|row| {
                let mut user = User::with_host(string_field(row, "name")?, string_field(row, "host")?);
                user.attributes = user_metadata(row.get("attributes"))?;
                Ok(user)
            })
            .collect()
    }

    pub fn flush_instance_logs(&self, logs: &[LogType]) -> Result<()> {
        self.sql(&CharmLoggingQueryBuilder::new().build_logs_flushing_query(logs))?;
        debug!(logs = logs.len(), "Flushed instance logs");
        Ok(())
    }

    /// This instance's label in the cluster metadata, if it is a member.
    pub fn get_cluster_instance_label(&self) -> Result<Option<String>> {
        let rows = self.sql(
            "SELECT instance_name FROM mysql_innodb_cluster_metadata.instances \
             WHERE mysql_server_uuid = @@server_uuid",
        )?;
        rows.first()
            .map(|row| string_field(row, "instance_name"))
            .transpose()
    }

    /// Labels of all members of `cluster_name`.
    pub fn get_cluster_instance_labels(&self, cluster_name: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT instance_name FROM mysql_innodb_cluster_metadata.instances \
             WHERE cluster_id = (SELECT cluster_id FROM mysql_innodb_cluster_metadata.clusters \
             WHERE cluster_name = {})",
            self.quoter.quote_value(cluster_name)
        );
        self.sql(&query)?
            .iter()
            .map(|row| string_field(row, "instance_name"))
            .collect()
    }

    /// Group replication member state; `None` outside a group.
    pub fn get_instance_replication_state(&self) -> Result<Option<InstanceStatus>> {
        let Some(label) = self.member_field("MEMBER_STATE")? else {
            return Ok(None);
        };
        InstanceStatus::parse(&label)
            .map(Some)
            .ok_or_else(|| ClientError::UnexpectedOutput(format!("member state {label:?}")))
    }

    /// Group replication member role; `None` outside a group.
    pub fn get_instance_replication_role(&self) -> Result<Option<InstanceRole>> {
        let Some(label) = self.member_field("MEMBER_ROLE")? else {
            return Ok(None);
        };
        InstanceRole::parse(&label)
            .map(Some)
            .ok_or_else(|| ClientError::UnexpectedOutput(format!("member role {label:?}")))
    }

    fn member_field(&self, column: &str) -> Result<Option<String>> {
        let query = format!(
            "SELECT {column} FROM performance_schema.replication_group_members \
             WHERE MEMBER_ID = @@server_uuid"
        );
        let rows = self.sql(&query)?;
        match rows.first().and_then(|row| row.get(column)) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(ClientError::UnexpectedOutput(format!("{column} = {other}"))),
        }
    }

    /// Current value of a system variable, as the server reports it.
    /// Persisted scopes are read back through the global scope.
    pub fn get_instance_variable(&self, scope: VariableScope, name: &str) -> Result<Value> {
        validate_variable_name(name)?;
        let query = format!("SELECT @@{}.{} AS value", scope.readable().as_str(), name);
        let rows = self.sql(&query)?;
        rows.first()
            .and_then(|row| row.get("value"))
            .cloned()
            .ok_or_else(|| ClientError::UnexpectedOutput(format!("no value for {name}")))
    }

    pub fn set_instance_variable(
        &self,
        scope: VariableScope,
        name: &str,
        value: impl Into<VariableValue>,
    ) -> Result<()> {
        validate_variable_name(name)?;
        let rendered = match value.into() {
            VariableValue::Integer(n) => n.to_string(),
            VariableValue::Boolean(true) => "ON".to_string(),
            VariableValue::Boolean(false) => "OFF".to_string(),
            VariableValue::Text(text) => self.quoter.quote_value(&text),
        };
        self.sql(&format!("SET @@{}.{} = {}", scope.as_str(), name, rendered))?;
        info!(scope = %scope, variable = name, "Set instance variable");
        Ok(())
    }

    pub fn install_instance_plugin(&self, name: &str, library: &str) -> Result<()> {
        let statement = format!(
            "INSTALL PLUGIN {} SONAME {}",
            self.quoter.quote_identifier(name),
            self.quoter.quote_value(library)
        );
        self.sql(&statement)?;
        info!(plugin = name, "Installed plugin");
        Ok(())
    }

    pub fn uninstall_instance_plugin(&self, name: &str) -> Result<()> {
        self.sql(&format!("UNINSTALL PLUGIN {}", self.quoter.quote_identifier(name)))?;
        info!(plugin = name, "Uninstalled plugin");
        Ok(())
    }

    /// Plugins installed with `INSTALL PLUGIN` matching the `LIKE` pattern.
    pub fn search_instance_plugins(&self, pattern: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT name FROM mysql.plugin WHERE name LIKE {}",
            self.quoter.quote_value(pattern)
        );
        self.sql(&query)?
            .iter()
            .map(|row| string_field(row, "name"))
            .collect()
    }

    pub fn search_instance_databases(&self, pattern: &str) -> Result<Vec<String>> {
        let query = format!(
            "SELECT SCHEMA_NAME AS name FROM information_schema.SCHEMATA WHERE SCHEMA_NAME LIKE {}",
            self.quoter.quote_value(pattern)
        );
        self.sql(&query)?
            .iter()
            .map(|row| string_field(row, "name"))
            .collect()
    }

    pub fn start_instance_replication(&self) -> Result<()> {
        self.sql("START GROUP_REPLICATION")?;
        info!("Started group replication");
        Ok(())
    }

    pub fn stop_instance_replication(&self) -> Result<()> {
        self.sql("STOP GROUP_REPLICATION")?;
        info!("Stopped group replication");
        Ok(())
    }
}

fn string_field(row: &Row, column: &str) -> Result<String> {
    match row.get(column) {
        Some(Value::String(s)) => Ok(s.clone()),
        other => Err(ClientError::UnexpectedOutput(format!(
            "column {column} is {other:?}, expected text"
        ))),
    }
}

/// `User_attributes` holds `{"metadata": {...}}`. The shell reports JSON
/// columns either as nested JSON or as text.
fn user_metadata(value: Option<&Value>) -> Result<BTreeMap<String, String>> {
    let parsed;
    let document = match value {
        None | Some(Value::Null) => return Ok(BTreeMap::new()),
        Some(Value::String(text)) => {
            parsed = serde_json::from_str::<Value>(text)
                .map_err(|e| ClientError::UnexpectedOutput(format!("user attributes: {e}")))?;
            &parsed
        }
        Some(other) => other,
    };

    let Some(metadata) = document.get("metadata").and_then(Value::as_object) else {
        return Ok(BTreeMap::new());
    };
    Ok(metadata
        .iter()
        .map(|(k, v)| {
            let v = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), v)
        })
        .collect())
}

fn validate_variable_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ClientError::InvalidVariableName(name.to_string()))
    }
}
