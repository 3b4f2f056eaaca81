//! InnoDB cluster operations, run as AdminAPI scripts in the shell's Python
//! mode.
//!
//! Caller values reach the script as JSON string literals (which are valid
//! Python literals) and structured options go through `json.loads`, so no
//! caller text is ever spliced into code unescaped.

use crate::error::{ClientError, Result};
use serde_json::{Map, Value};
use shellctl_executor::{Executor, DEFAULT_TIMEOUT};
use std::time::Duration;
use tracing::info;

/// Script literal for a string.
fn py_str(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Script expression evaluating to `options` as a dict.
fn py_options(options: &Map<String, Value>) -> String {
    format!("json.loads({})", py_str(&Value::Object(options.clone()).to_string()))
}

fn instance_address(host: &str, port: u16) -> String {
    format!("{host}:{port}")
}

pub struct MySQLClusterClient<E> {
    executor: E,
    timeout: Duration,
}

impl<E: Executor> MySQLClusterClient<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// AdminAPI calls routinely outlast single statements; callers adding
    /// instances should raise this.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn run(&self, lines: &[String]) -> Result<String> {
        Ok(self.executor.execute_script(&lines.join("\n"), self.timeout)?)
    }

    fn run_json(&self, lines: &[String]) -> Result<Map<String, Value>> {
        let output = self.run(lines)?;
        match serde_json::from_str::<Value>(&output) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ClientError::UnexpectedOutput(format!(
                "expected a JSON object, got {}",
                type_name(&other)
            ))),
            Err(e) => Err(ClientError::UnexpectedOutput(format!(
                "script output is not JSON: {e}"
            ))),
        }
    }

    fn get_cluster(cluster_name: &str) -> String {
        format!("cluster = dba.get_cluster({})", py_str(cluster_name))
    }

    /// `cluster.status()` as returned by the AdminAPI.
    pub fn fetch_cluster_status(&self, cluster_name: &str) -> Result<Map<String, Value>> {
        self.run_json(&[
            Self::get_cluster(cluster_name),
            "print(cluster.status())".to_string(),
        ])
    }

    /// `cluster.list_routers()`; the routers live under `"routers"`.
    pub fn list_cluster_routers(&self, cluster_name: &str) -> Result<Map<String, Value>> {
        self.run_json(&[
            Self::get_cluster(cluster_name),
            "print(cluster.list_routers())".to_string(),
        ])
    }

    /// Whether the connected instance is configured well enough to join a
    /// cluster.
    pub fn check_instance_before_cluster(&self) -> Result<bool> {
        let result = self.run_json(&["print(dba.check_instance_configuration())".to_string()])?;
        match result.get("status").and_then(Value::as_str) {
            Some(status) => Ok(status == "ok"),
            None => Err(ClientError::UnexpectedOutput(
                "configuration check has no status".to_string(),
            )),
        }
    }

    pub fn add_instance_to_cluster(
        &self,
        cluster_name: &str,
        instance_host: &str,
        instance_port: u16,
        options: &Map<String, Value>,
    ) -> Result<()> {
        let address = instance_address(instance_host, instance_port);
        self.run(&[
            "import json".to_string(),
            Self::get_cluster(cluster_name),
            format!("cluster.add_instance({}, {})", py_str(&address), py_options(options)),
        ])?;
        info!(cluster = cluster_name, instance = %address, "Added instance to cluster");
        Ok(())
    }

    pub fn remove_instance_from_cluster(
        &self,
        cluster_name: &str,
        instance_host: &str,
        instance_port: u16,
        force: bool,
    ) -> Result<()> {
        let address = instance_address(instance_host, instance_port);
        let mut options = Map::new();
        options.insert("force".to_string(), Value::Bool(force));
        self.run(&[
            "import json".to_string(),
            Self::get_cluster(cluster_name),
            format!("cluster.remove_instance({}, {})", py_str(&address), py_options(&options)),
        ])?;
        info!(cluster = cluster_name, instance = %address, force, "Removed instance from cluster");
        Ok(())
    }

    /// Apply each option with `cluster.set_instance_option`.
    pub fn update_instance_within_cluster(
        &self,
        cluster_name: &str,
        instance_host: &str,
        instance_port: u16,
        options: &Map<String, Value>,
    ) -> Result<()> {
        let address = instance_address(instance_host, instance_port);
        self.run(&[
            "import json".to_string(),
            Self::get_cluster(cluster_name),
            format!("options = {}", py_options(options)),
            "for key, value in options.items():".to_string(),
            format!("    cluster.set_instance_option({}, key, value)", py_str(&address)),
        ])?;
        info!(cluster = cluster_name, instance = %address, options = options.len(), "Updated instance options");
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
