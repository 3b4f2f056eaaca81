//! LocalExecutor against a fake management shell.

use serde_json::json;
use shellctl_executor::{ExecutionError, Executor, LocalExecutor};
use shellctl_protocol::ConnectionDetails;
use shellctl_test_utils::{FakeShell, Reply};
use std::time::{Duration, Instant};

const PASSWORD: &str = "Zx9-secret'pass";
const TIMEOUT: Duration = Duration::from_secs(10);

fn tcp_executor(shell: &FakeShell, password: &str) -> LocalExecutor {
    LocalExecutor::new(
        ConnectionDetails::tcp("clusteradmin", password, "127.0.0.1", 3306),
        shell.path(),
    )
}

#[test]
fn test_select_one_returns_computed_column() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_sql("SELECT 1", Reply::rows(json!([{"1": 1}])))
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let rows = executor.execute_sql("SELECT 1", TIMEOUT).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["1"], json!(1));
}

#[test]
fn test_malformed_statement_surfaces_server_message() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_sql(
            "SELECT",
            Reply::sql_error(
                1064,
                "You have an error in your SQL syntax; check the manual that corresponds to your MySQL server version for the right syntax to use near '' at line 1",
            ),
        )
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let err = executor.execute_sql("SELECT", TIMEOUT).unwrap_err();
    let message = err.message().expect("syntax error carries a message");
    assert!(message.starts_with("You have an error in your SQL syntax"));
}

#[test]
fn test_bad_password_is_opaque_failure() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_sql("SELECT 1", Reply::rows(json!([{"1": 1}])))
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, "wrong-password");

    let err = executor.execute_sql("SELECT 1", TIMEOUT).unwrap_err();
    assert_eq!(err, ExecutionError::failed(None));

    let err = executor.check_connection().unwrap_err();
    assert_eq!(err, ExecutionError::failed(None));
}

#[test]
fn test_check_connection_succeeds_with_good_password() {
    let shell = FakeShell::builder().password(PASSWORD).build().unwrap();
    tcp_executor(&shell, PASSWORD).check_connection().unwrap();

    let calls = shell.invocations().unwrap();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].body().is_none());
}

#[test]
fn test_script_output_is_trimmed_info() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_script(
            "print('a')\nprint('b')",
            Reply::info("a\n").and_json(json!({"info": "b\n"})),
        )
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let output = executor
        .execute_script("print('a')\nprint('b')", TIMEOUT)
        .unwrap();
    assert_eq!(output, "a\nb");
}

#[test]
fn test_script_error_is_flat_message() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_script(
            "cluster = dba.get_cluster('missing')",
            Reply::script_error("Dba.get_cluster: This function is not available through a session to a standalone instance"),
        )
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let err = executor
        .execute_script("cluster = dba.get_cluster('missing')", TIMEOUT)
        .unwrap_err();
    assert!(err
        .message()
        .unwrap()
        .starts_with("Dba.get_cluster: This function is not available"));
}

#[test]
fn test_opaque_success_output_is_returned_verbatim() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_script("shell.status()", Reply::text("  MySQL Shell version 8.0.36  "))
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let output = executor.execute_script("shell.status()", TIMEOUT).unwrap();
    assert_eq!(output, "MySQL Shell version 8.0.36");
}

#[test]
fn test_stderr_is_merged_into_transcript() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_sql(
            "SELECT 1",
            Reply::rows(json!([{"1": 1}])).and_stderr("{\"warning\":\"deprecated option\"}"),
        )
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let rows = executor.execute_sql("SELECT 1", TIMEOUT).unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_prompt_on_stderr_never_swallows_payload() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .prompt_on_stderr()
        .on_sql("SELECT 1", Reply::rows(json!([{"1": 1}])))
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let empty_runs = (0..100)
        .filter(|_| executor.execute_sql("SELECT 1", TIMEOUT).unwrap().is_empty())
        .count();
    assert_eq!(empty_runs, 0);
}

#[test]
fn test_prompt_on_stderr_script_output() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .prompt_on_stderr()
        .on_script("print('hello')", Reply::info("hello"))
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    for _ in 0..20 {
        assert_eq!(
            executor.execute_script("print('hello')", TIMEOUT).unwrap(),
            "hello"
        );
    }
}

#[test]
fn test_huge_timeout_is_unbounded_wait() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_sql("SELECT 1", Reply::rows(json!([{"1": 1}])))
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let rows = executor
        .execute_sql("SELECT 1", Duration::from_secs(u64::MAX))
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_timeout_kills_process() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_sql(
            "SELECT SLEEP(30)",
            Reply::rows(json!([{"SLEEP(30)": 0}])).with_delay(Duration::from_secs(30)),
        )
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    let started = Instant::now();
    let err = executor
        .execute_sql("SELECT SLEEP(30)", Duration::from_millis(500))
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[test]
fn test_password_only_on_stdin() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_sql("SELECT 1", Reply::rows(json!([{"1": 1}])))
        .on_sql("SELECT", Reply::sql_error(1064, "You have an error in your SQL syntax"))
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    executor.execute_sql("SELECT 1", TIMEOUT).unwrap();
    let err = executor.execute_sql("SELECT", TIMEOUT).unwrap_err();
    assert!(!err.to_string().contains(PASSWORD));
    assert!(!format!("{err:?}").contains(PASSWORD));
    assert!(!format!("{executor:?}").contains(PASSWORD));

    for call in shell.invocations().unwrap() {
        assert_eq!(call.stdin, PASSWORD);
        assert!(call.args.iter().all(|a| !a.contains(PASSWORD)));
        assert!(call.has_arg("--passwords-from-stdin"));
        assert!(call.has_arg("--json=raw"));
    }
}

#[test]
fn test_socket_addressing() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .on_sql("SELECT 1", Reply::rows(json!([{"1": 1}])))
        .build()
        .unwrap();
    let executor = LocalExecutor::new(
        ConnectionDetails::socket("root", PASSWORD, "/var/run/mysqld/mysqld.sock"),
        shell.path(),
    );

    executor.execute_sql("SELECT 1", TIMEOUT).unwrap();

    let calls = shell.invocations().unwrap();
    assert!(calls[0].has_arg("--socket=/var/run/mysqld/mysqld.sock"));
    assert!(calls[0].has_arg("--user=root"));
    assert!(!calls[0].args.iter().any(|a| a.starts_with("--host=")));
}

#[test]
fn test_one_process_per_call_without_retry() {
    let shell = FakeShell::builder()
        .password(PASSWORD)
        .otherwise(Reply::sql_error(2013, "Lost connection to MySQL server during query"))
        .build()
        .unwrap();
    let executor = tcp_executor(&shell, PASSWORD);

    assert!(executor.execute_sql("SELECT 42", TIMEOUT).is_err());
    assert_eq!(shell.invocations().unwrap().len(), 1);
}
