//! A stand-in for `mysqlsh` that speaks its process protocol.
//!
//! The fake is a POSIX shell script written to a scratch directory. It reads
//! the password line from stdin, prints the password prompt as the first line
//! of output, then answers from a table of canned replies keyed by execution
//! mode and `--execute` body. Every invocation's argv and stdin are recorded
//! so tests can assert what crossed the process boundary.

use serde_json::{json, Value};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// What the fake prints and how it exits for one matched input.
#[derive(Debug, Clone)]
pub struct Reply {
    lines: Vec<(Stream, String)>,
    exit_code: i32,
    delay: Option<Duration>,
}

impl Reply {
    /// No payload, exit 0.
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            exit_code: 0,
            delay: None,
        }
    }

    /// One JSON document on stdout, exit 0.
    pub fn json(doc: Value) -> Self {
        Self::empty().and_json(doc)
    }

    /// A result set as `--json=raw` reports it.
    pub fn rows(rows: Value) -> Self {
        Self::json(json!({
            "hasData": true,
            "rows": rows,
            "executionTime": "0.0004 sec",
            "affectedRowCount": 0,
            "warningsCount": 0,
            "warnings": [],
            "info": "",
            "autoIncrementValue": 0
        }))
    }

    /// Output of a `print()` call in Python mode.
    pub fn info(text: &str) -> Self {
        Self::json(json!({ "info": text }))
    }

    /// A server error in SQL mode: nested `error.message`, exit 1.
    pub fn sql_error(code: u32, message: &str) -> Self {
        Self::json(json!({
            "error": {
                "code": code,
                "line": 1,
                "message": message,
                "state": "42000",
                "type": "MySQL Error"
            }
        }))
        .with_exit_code(1)
    }

    /// An uncaught exception in Python mode: flat `error`, exit 1.
    pub fn script_error(message: &str) -> Self {
        Self::json(json!({ "error": message })).with_exit_code(1)
    }

    /// A plain, non-JSON line on stdout.
    pub fn text(line: &str) -> Self {
        Self::empty().and_text(line)
    }

    pub fn and_json(mut self, doc: Value) -> Self {
        self.lines.push((Stream::Stdout, doc.to_string()));
        self
    }

    pub fn and_text(mut self, line: &str) -> Self {
        self.lines.push((Stream::Stdout, line.to_string()));
        self
    }

    /// A line on stderr. Printed after all stdout lines.
    pub fn and_stderr(mut self, line: &str) -> Self {
        self.lines.push((Stream::Stderr, line.to_string()));
        self
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Sleep before printing anything, to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn render(&self) -> String {
        let mut out = String::new();
        if let Some(delay) = self.delay {
            out.push_str(&format!("    sleep {:.3}\n", delay.as_secs_f64()));
        }
        for stream in [Stream::Stdout, Stream::Stderr] {
            for (_, line) in self.lines.iter().filter(|(s, _)| *s == stream) {
                let redirect = if stream == Stream::Stderr { " >&2" } else { "" };
                out.push_str(&format!("    printf '%s\\n' {}{}\n", sh_quote(line), redirect));
            }
        }
        out.push_str(&format!("    exit {}\n", self.exit_code));
        out
    }
}

/// One recorded run of the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    /// First line read from stdin.
    pub stdin: String,
}

impl Invocation {
    /// The `--execute` body, when present.
    pub fn body(&self) -> Option<&str> {
        let pos = self.args.iter().position(|a| a == "--execute")?;
        self.args.get(pos + 1).map(String::as_str)
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }
}

pub struct FakeShellBuilder {
    password: String,
    prompt_stream: Stream,
    connect: Reply,
    sql: Vec<(String, Reply)>,
    script: Vec<(String, Reply)>,
    fallback: Reply,
}

impl FakeShellBuilder {
    /// Password the fake accepts; anything else is rejected the way the real
    /// shell rejects bad credentials (plain text, exit 1).
    pub fn password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    /// Print the password prompt on stderr while replies go to stdout.
    pub fn prompt_on_stderr(mut self) -> Self {
        self.prompt_stream = Stream::Stderr;
        self
    }

    pub fn on_connect(mut self, reply: Reply) -> Self {
        self.connect = reply;
        self
    }

    pub fn on_sql(mut self, statement: &str, reply: Reply) -> Self {
        self.sql.push((statement.to_string(), reply));
        self
    }

    pub fn on_script(mut self, code: &str, reply: Reply) -> Self {
        self.script.push((code.to_string(), reply));
        self
    }

    /// Reply for any input without a canned answer.
    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.fallback = reply;
        self
    }

    pub fn build(self) -> io::Result<FakeShell> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("calls"))?;
        let path = dir.path().join("mysqlsh");

        fs::write(&path, self.render(dir.path()))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;

        Ok(FakeShell { dir, path })
    }

    fn render(&self, state_dir: &Path) -> String {
        let mut script = String::from("#!/bin/sh\n");
        script.push_str(&format!(
            "STATE_DIR={}\n",
            sh_quote(&state_dir.to_string_lossy())
        ));
        script.push_str(&format!("EXPECTED_PASSWORD={}\n", sh_quote(&self.password)));
        let prompt_redirect = match self.prompt_stream {
            Stream::Stdout => "",
            Stream::Stderr => " >&2",
        };
        script.push_str(&PREAMBLE.replace("{PROMPT_REDIRECT}", prompt_redirect));

        script.push_str("case \"$mode:$body\" in\n");
        script.push_str("  ':')\n");
        script.push_str(&self.connect.render());
        script.push_str("    ;;\n");
        for (prefix, entries) in [("sql", &self.sql), ("py", &self.script)] {
            for (body, reply) in entries {
                script.push_str(&format!("  {})\n", sh_quote(&format!("{}:{}", prefix, body))));
                script.push_str(&reply.render());
                script.push_str("    ;;\n");
            }
        }
        script.push_str("  *)\n");
        script.push_str(&self.fallback.render());
        script.push_str("    ;;\n");
        script.push_str("esac\n");
        script
    }
}

const PREAMBLE: &str = r#"
IFS= read -r password
n=$(( $(cat "$STATE_DIR/counter" 2>/dev/null || echo 0) + 1 ))
echo "$n" > "$STATE_DIR/counter"
printf '%s\0' "$@" > "$STATE_DIR/calls/$n.args"
printf '%s' "$password" > "$STATE_DIR/calls/$n.stdin"

mode=
body=
user=
target=
next=
for arg in "$@"; do
  if [ -n "$next" ]; then
    body=$arg
    next=
    continue
  fi
  case $arg in
    --execute) next=1 ;;
    --sql) mode=sql ;;
    --py) mode=py ;;
    --user=*) user=${arg#--user=} ;;
    --host=*) target=${arg#--host=} ;;
    --socket=*) target=${arg#--socket=} ;;
  esac
done

prompt="Please provide the password for '$user@$target': "
printf '%s\n' "$prompt"{PROMPT_REDIRECT}

if [ "$password" != "$EXPECTED_PASSWORD" ]; then
  printf '%s\n' "MySQL Error 1045 (28000): Access denied for user '$user'@'$target' (using password: YES)"
  exit 1
fi

"#;

/// Executable fake `mysqlsh`; the scratch directory lives as long as this.
pub struct FakeShell {
    dir: TempDir,
    path: PathBuf,
}

impl FakeShell {
    pub fn builder() -> FakeShellBuilder {
        FakeShellBuilder {
            password: String::new(),
            prompt_stream: Stream::Stdout,
            connect: Reply::empty(),
            sql: Vec::new(),
            script: Vec::new(),
            fallback: Reply::sql_error(1064, "fake shell has no reply for this input"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded invocations, oldest first.
    pub fn invocations(&self) -> io::Result<Vec<Invocation>> {
        let calls = self.dir.path().join("calls");
        let mut numbered = Vec::new();
        for entry in fs::read_dir(&calls)? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if let Some(n) = name.strip_suffix(".args").and_then(|n| n.parse::<u32>().ok()) {
                numbered.push(n);
            }
        }
        numbered.sort_unstable();

        numbered
            .into_iter()
            .map(|n| {
                let raw = fs::read_to_string(calls.join(format!("{n}.args")))?;
                let args = raw
                    .strip_suffix('\0')
                    .unwrap_or(&raw)
                    .split('\0')
                    .map(str::to_string)
                    .collect();
                let stdin = fs::read_to_string(calls.join(format!("{n}.stdin")))?;
                Ok(Invocation { args, stdin })
            })
            .collect()
    }
}

fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
