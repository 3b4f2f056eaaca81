//! Framing and parsing of management shell output.
//!
//! The shell always prints its password prompt as the first line, whichever
//! channel the password arrives on. Everything after that first newline is
//! the payload: in `--json=raw` mode, one JSON document per line (one per
//! statement or `print` call), or plain text when the shell failed before it
//! switched to JSON.

use serde_json::Value;

/// A single result row: column name to value, names as the shell reports
/// them (including computed names such as `COUNT(*)`).
pub type Row = serde_json::Map<String, Value>;

/// Parsed payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Nothing after the prompt line.
    Empty,
    /// Every document parsed as JSON.
    Structured(Vec<Value>),
    /// Text that is not a JSON stream, kept verbatim.
    Opaque(String),
}

/// Drop the prompt line; no newline means there is no payload.
pub fn strip_prompt(transcript: &str) -> &str {
    match transcript.split_once('\n') {
        Some((_prompt, rest)) => rest,
        None => "",
    }
}

/// Parse a full transcript (prompt line included).
pub fn parse_transcript(transcript: &str) -> Payload {
    parse_payload(strip_prompt(transcript))
}

pub fn parse_payload(payload: &str) -> Payload {
    if payload.trim().is_empty() {
        return Payload::Empty;
    }

    let documents: Result<Vec<Value>, _> = serde_json::Deserializer::from_str(payload)
        .into_iter::<Value>()
        .collect();

    match documents {
        Ok(documents) if !documents.is_empty() => Payload::Structured(documents),
        Ok(_) => Payload::Empty,
        Err(_) => Payload::Opaque(payload.to_string()),
    }
}

impl Payload {
    /// Script output: the `info` fields of all documents, in order, trimmed.
    /// Opaque text is returned trimmed as-is.
    pub fn script_output(&self) -> String {
        match self {
            Payload::Empty => String::new(),
            Payload::Opaque(text) => text.trim().to_string(),
            Payload::Structured(documents) => {
                let info: String = documents
                    .iter()
                    .filter_map(|doc| doc.get("info").and_then(Value::as_str))
                    .collect();
                info.trim().to_string()
            }
        }
    }

    /// Query output: rows of the last document carrying a `rows` array.
    pub fn rows(&self) -> Vec<Row> {
        let Payload::Structured(documents) = self else {
            return Vec::new();
        };

        documents
            .iter()
            .rev()
            .find_map(|doc| doc.get("rows").and_then(Value::as_array))
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| row.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Error text of a failed script: `error` is a plain string, or an
    /// object with a `message`.
    pub fn script_error(&self) -> Option<String> {
        let error = self.first_error()?;
        match error {
            Value::String(message) => Some(message.clone()),
            Value::Object(_) => nested_message(error),
            _ => None,
        }
    }

    /// Error text of a failed statement: only `error.message` counts.
    pub fn sql_error(&self) -> Option<String> {
        nested_message(self.first_error()?)
    }

    fn first_error(&self) -> Option<&Value> {
        let Payload::Structured(documents) = self else {
            return None;
        };
        documents.iter().find_map(|doc| doc.get("error"))
    }
}

fn nested_message(error: &Value) -> Option<String> {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PROMPT: &str = "Please provide the password for 'root@127.0.0.1:3306': ";

    #[test]
    fn test_strip_prompt() {
        assert_eq!(strip_prompt(&format!("{PROMPT}\n{{\"info\":\"x\"}}\n")), "{\"info\":\"x\"}\n");
        assert_eq!(strip_prompt(PROMPT), "");
        assert_eq!(strip_prompt(""), "");
    }

    #[test]
    fn test_prompt_line_never_parsed() {
        // A prompt that happens to be valid JSON is still dropped.
        let payload = parse_transcript("{\"info\":\"prompt\"}\n{\"info\":\"real\"}\n");
        assert_eq!(payload.script_output(), "real");
    }

    #[test]
    fn test_script_output_concatenates_info() {
        let transcript = format!(
            "{PROMPT}\n{{\"info\":\"hello\\n\"}}\n{{\"warning\":\"deprecated\"}}\n{{\"info\":\"world\\n\"}}\n"
        );
        assert_eq!(parse_transcript(&transcript).script_output(), "hello\nworld");
    }

    #[test]
    fn test_script_output_defaults_to_empty() {
        let transcript = format!("{PROMPT}\n{{\"hasData\":false}}\n");
        assert_eq!(parse_transcript(&transcript).script_output(), "");
        assert_eq!(parse_transcript(PROMPT).script_output(), "");
    }

    #[test]
    fn test_opaque_text_is_kept() {
        let transcript = format!("{PROMPT}\n  plain text output  \n");
        let payload = parse_transcript(&transcript);
        assert!(matches!(payload, Payload::Opaque(_)));
        assert_eq!(payload.script_output(), "plain text output");
        assert!(payload.rows().is_empty());
    }

    #[test]
    fn test_rows_use_last_result_set() {
        let transcript = format!(
            "{PROMPT}\n{}\n{}\n",
            json!({"hasData": false, "rows": [], "affectedRowCount": 1}),
            json!({"hasData": true, "rows": [{"COUNT(*)": 2}]}),
        );
        let rows = parse_transcript(&transcript).rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["COUNT(*)"], json!(2));
    }

    #[test]
    fn test_rows_keep_select_column_order() {
        let transcript = format!(
            "{PROMPT}\n{}\n",
            r#"{"hasData": true, "rows": [{"user": "root", "host": "%", "b": 1, "a": 2}]}"#
        );
        let rows = parse_transcript(&transcript).rows();
        let columns: Vec<&str> = rows[0].keys().map(String::as_str).collect();
        assert_eq!(columns, ["user", "host", "b", "a"]);
    }

    #[test]
    fn test_rows_default_to_empty() {
        let transcript = format!("{PROMPT}\n{}\n", json!({"hasData": false}));
        assert!(parse_transcript(&transcript).rows().is_empty());
    }

    #[test]
    fn test_sql_error_is_nested() {
        let transcript = format!(
            "{PROMPT}\n{}\n",
            json!({"error": {"code": 1064, "message": "You have an error in your SQL syntax", "state": "42000"}}),
        );
        let payload = parse_transcript(&transcript);
        assert_eq!(
            payload.sql_error().as_deref(),
            Some("You have an error in your SQL syntax")
        );
    }

    #[test]
    fn test_script_error_is_flat() {
        let transcript = format!(
            "{PROMPT}\n{}\n",
            json!({"error": "NameError: name 'foo' is not defined"}),
        );
        let payload = parse_transcript(&transcript);
        assert_eq!(
            payload.script_error().as_deref(),
            Some("NameError: name 'foo' is not defined")
        );
        // A flat error is malformed for SQL execution.
        assert_eq!(payload.sql_error(), None);
    }

    #[test]
    fn test_malformed_error_yields_none() {
        let transcript = format!("{PROMPT}\n{}\n", json!({"error": {"code": 1045}}));
        assert_eq!(parse_transcript(&transcript).sql_error(), None);

        let transcript = format!("{PROMPT}\nERROR: Access denied\n");
        assert_eq!(parse_transcript(&transcript).sql_error(), None);
        assert_eq!(parse_transcript(&transcript).script_error(), None);
    }
}
