//! Server log maintenance statements.

use shellctl_protocol::LogType;

#[derive(Debug, Clone, Copy, Default)]
pub struct CharmLoggingQueryBuilder;

impl CharmLoggingQueryBuilder {
    pub fn new() -> Self {
        Self
    }

    /// `FLUSH LOGS` when `logs` is empty (every log family), otherwise a
    /// single statement flushing only the listed families. Duplicates are
    /// dropped, order kept.
    pub fn build_logs_flushing_query(&self, logs: &[LogType]) -> String {
        if logs.is_empty() {
            return "FLUSH LOGS".to_string();
        }

        let mut seen = Vec::with_capacity(logs.len());
        for log in logs {
            if !seen.contains(log) {
                seen.push(*log);
            }
        }

        let targets: Vec<String> = seen
            .iter()
            .map(|log| format!("{} LOGS", log.as_str()))
            .collect();
        format!("FLUSH {}", targets.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_all_logs() {
        assert_eq!(CharmLoggingQueryBuilder::new().build_logs_flushing_query(&[]), "FLUSH LOGS");
    }

    #[test]
    fn test_flush_selected_logs() {
        let query = CharmLoggingQueryBuilder::new()
            .build_logs_flushing_query(&[LogType::General, LogType::Error, LogType::General]);
        assert_eq!(query, "FLUSH GENERAL LOGS, ERROR LOGS");
    }
}
