//! In-process [`Executor`] driven by a closure, for tests of code layered on
//! the execution protocol.

use serde_json::Value;
use shellctl_executor::{ExecutionError, Executor, Row};
use shellctl_protocol::ConnectionDetails;
use std::sync::Mutex;
use std::time::Duration;

/// A call the executor received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CheckConnection,
    Script(String),
    Sql(String),
}

impl Call {
    pub fn body(&self) -> Option<&str> {
        match self {
            Call::CheckConnection => None,
            Call::Script(body) | Call::Sql(body) => Some(body),
        }
    }
}

/// Answer produced by the handler.
#[derive(Debug, Clone)]
pub enum Response {
    Done,
    Text(String),
    Rows(Vec<Row>),
    Error(ExecutionError),
}

impl Response {
    pub fn text(text: impl Into<String>) -> Self {
        Response::Text(text.into())
    }

    /// Rows from a JSON array of objects; non-objects are skipped.
    pub fn rows(rows: Value) -> Self {
        Response::Rows(rows_from_json(rows))
    }

    pub fn failed(message: &str) -> Self {
        Response::Error(ExecutionError::failed(Some(message.to_string())))
    }
}

pub fn rows_from_json(rows: Value) -> Vec<Row> {
    match rows {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

type Handler = Box<dyn Fn(&Call) -> Response + Send + Sync>;

/// Executor that records every call and answers through a handler.
pub struct ScriptedExecutor {
    details: ConnectionDetails,
    handler: Handler,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedExecutor {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Call) -> Response + Send + Sync + 'static,
    {
        Self {
            details: ConnectionDetails::tcp("clusteradmin", "scripted-password", "127.0.0.1", 3306),
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every call with empty success.
    pub fn accepting() -> Self {
        Self::new(|call| match call {
            Call::Sql(_) => Response::Rows(Vec::new()),
            Call::Script(_) => Response::text(""),
            Call::CheckConnection => Response::Done,
        })
    }

    /// Replays `responses` in order; once exhausted, every call fails.
    pub fn queued(responses: Vec<Response>) -> Self {
        let queue = Mutex::new(responses.into_iter());
        Self::new(move |_| {
            queue
                .lock()
                .ok()
                .and_then(|mut q| q.next())
                .unwrap_or_else(|| Response::failed("scripted executor exhausted"))
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Bodies of the SQL statements received, in order.
    pub fn sql_statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Sql(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// Bodies of the scripts received, in order.
    pub fn scripts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Script(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn dispatch(&self, call: Call) -> Response {
        let response = (self.handler)(&call);
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        response
    }
}

fn mismatch(expected: &str, got: &Response) -> ExecutionError {
    ExecutionError::process(format!("scripted executor: expected {expected}, handler gave {got:?}"))
}

impl Executor for ScriptedExecutor {
    fn connection_details(&self) -> &ConnectionDetails {
        &self.details
    }

    fn check_connection(&self) -> Result<(), ExecutionError> {
        match self.dispatch(Call::CheckConnection) {
            Response::Done => Ok(()),
            Response::Error(e) => Err(e),
            other => Err(mismatch("done", &other)),
        }
    }

    fn execute_script(&self, code: &str, _timeout: Duration) -> Result<String, ExecutionError> {
        match self.dispatch(Call::Script(code.to_string())) {
            Response::Text(text) => Ok(text),
            Response::Done => Ok(String::new()),
            Response::Error(e) => Err(e),
            other => Err(mismatch("text", &other)),
        }
    }

    fn execute_sql(&self, statement: &str, _timeout: Duration) -> Result<Vec<Row>, ExecutionError> {
        match self.dispatch(Call::Sql(statement.to_string())) {
            Response::Rows(rows) => Ok(rows),
            Response::Done => Ok(Vec::new()),
            Response::Error(e) => Err(e),
            other => Err(mismatch("rows", &other)),
        }
    }
}
