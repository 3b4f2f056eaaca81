//! End-to-end tests against a real server through a real `mysqlsh`.
//!
//! Run with:
//!   MYSQL_SHELL_PATH=/snap/bin/mysqlsh MYSQL_USERNAME=root MYSQL_PASSWORD=... \
//!   cargo test -p shellctl_clients --features mysql-tests

#![cfg(feature = "mysql-tests")]

use serde_json::json;
use shellctl_builders::LockTask;
use shellctl_clients::{MySQLInstanceClient, TaskLocker};
use shellctl_executor::{ExecutionError, Executor, DEFAULT_TIMEOUT};
use shellctl_protocol::{LogType, Role, User, VariableScope};
use shellctl_test_utils::LiveShellConfig;

fn config() -> LiveShellConfig {
    LiveShellConfig::from_env()
        .expect("MYSQL_SHELL_PATH, MYSQL_USERNAME and MYSQL_PASSWORD must be set")
}

#[test]
fn test_select_one() {
    let rows = config().executor().execute_sql("SELECT 1", DEFAULT_TIMEOUT).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["1"], json!(1));
}

#[test]
fn test_count_keeps_computed_column_name() {
    let rows = config()
        .executor()
        .execute_sql("SELECT COUNT(*) FROM mysql.user", DEFAULT_TIMEOUT)
        .unwrap();
    assert!(rows[0].contains_key("COUNT(*)"));
}

#[test]
fn test_malformed_select() {
    let err = config()
        .executor()
        .execute_sql("SELECT", DEFAULT_TIMEOUT)
        .unwrap_err();
    assert!(err
        .message()
        .unwrap()
        .starts_with("You have an error in your SQL syntax"));
}

#[test]
fn test_invalid_password() {
    let executor = config().executor_with_password("definitely-not-the-password");
    assert_eq!(
        executor.check_connection().unwrap_err(),
        ExecutionError::failed(None)
    );
}

#[test]
fn test_script_print() {
    let output = config()
        .executor()
        .execute_script("print('hello')", DEFAULT_TIMEOUT)
        .unwrap();
    assert_eq!(output, "hello");
}

#[test]
fn test_lock_lifecycle() {
    let locker = TaskLocker::new(config().executor(), "mysql", "locking");
    let task = LockTask::InstanceAddition;

    locker.initialize().unwrap();
    locker.initialize().unwrap();
    locker.force_release(task).unwrap();

    assert!(locker.try_acquire(task, "node-1").unwrap());
    assert!(!locker.try_acquire(task, "node-2").unwrap());
    assert_eq!(locker.fetch_holder(task).unwrap().as_deref(), Some("node-1"));

    assert!(locker.release(task, "node-1").unwrap());
    assert_eq!(locker.fetch_holder(task).unwrap(), None);

    assert!(locker.try_acquire(task, "node-2").unwrap());
    assert!(locker.release(task, "node-2").unwrap());
}

#[test]
fn test_instance_user_lifecycle() {
    let config = config();
    let client = MySQLInstanceClient::new(config.executor());
    let user = User::new("shellctl_live_user").with_attribute("key", "val");

    client.delete_instance_user(&user).unwrap();
    client.create_instance_user(&user, "password", &[]).unwrap();

    let users = client.search_instance_users("shellctl_live_%", None).unwrap();
    assert!(users.contains(&user));

    client.update_instance_user(&user, "password_new").unwrap();
    client.delete_instance_user(&user).unwrap();
    assert!(client
        .search_instance_users("shellctl_live_%", None)
        .unwrap()
        .is_empty());
}

#[test]
fn test_instance_role_and_logs() {
    let client = MySQLInstanceClient::new(config().executor());
    let role = Role::new("shellctl_live_role");

    client
        .executor()
        .execute_sql("DROP ROLE IF EXISTS 'shellctl_live_role'@'%'", DEFAULT_TIMEOUT)
        .unwrap();
    client.create_instance_role(&role, &[]).unwrap();
    assert!(client.search_instance_roles("shellctl_live_%").unwrap().contains(&role));
    client
        .executor()
        .execute_sql("DROP ROLE IF EXISTS 'shellctl_live_role'@'%'", DEFAULT_TIMEOUT)
        .unwrap();

    client.flush_instance_logs(&[]).unwrap();
    client
        .flush_instance_logs(&[LogType::General, LogType::Error])
        .unwrap();
}

#[test]
fn test_instance_variable_round_trip() {
    let client = MySQLInstanceClient::new(config().executor());
    let previous = client
        .get_instance_variable(VariableScope::Global, "max_connections")
        .unwrap();

    client
        .set_instance_variable(VariableScope::Global, "max_connections", 100)
        .unwrap();
    assert_eq!(
        client
            .get_instance_variable(VariableScope::Global, "max_connections")
            .unwrap(),
        json!(100)
    );

    let previous = previous.as_i64().unwrap();
    client
        .set_instance_variable(VariableScope::Global, "max_connections", previous)
        .unwrap();
}
