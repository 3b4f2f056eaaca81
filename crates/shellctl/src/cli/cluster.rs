//! `shellctl cluster`: read-only AdminAPI queries.

use crate::cli::context::Session;
use anyhow::{Context, Result};
use clap::Subcommand;
use shellctl_clients::MySQLClusterClient;

#[derive(Subcommand, Debug, Clone)]
pub enum ClusterAction {
    /// Print `cluster.status()` as JSON
    Status { cluster: String },
    /// Print `cluster.list_routers()` as JSON
    Routers { cluster: String },
    /// Check whether the connected instance can join a cluster
    CheckInstance,
}

pub fn run(action: ClusterAction, session: &Session) -> Result<()> {
    let client = MySQLClusterClient::new(session.executor()).with_timeout(session.timeout);

    match action {
        ClusterAction::Status { cluster } => {
            let status = client
                .fetch_cluster_status(&cluster)
                .with_context(|| format!("Failed to fetch status of cluster {}", cluster))?;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        ClusterAction::Routers { cluster } => {
            let routers = client
                .list_cluster_routers(&cluster)
                .with_context(|| format!("Failed to list routers of cluster {}", cluster))?;
            println!("{}", serde_json::to_string_pretty(&routers)?);
        }
        ClusterAction::CheckInstance => {
            let ready = client
                .check_instance_before_cluster()
                .context("Instance configuration check failed")?;
            if ready {
                println!("Instance is ready for clustering");
            } else {
                anyhow::bail!("Instance is not configured for clustering; run dba.configure_instance()");
            }
        }
    }
    Ok(())
}
