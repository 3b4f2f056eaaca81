//! Local executor: one management shell subprocess per call.
//!
//! The password goes to the child's stdin right after spawn and is never part
//! of argv. stdout and stderr share one pipe, so the transcript keeps the
//! order the child wrote in even when the prompt goes to stderr and the
//! payload to stdout. A single reader thread drains it. All waiting is
//! synchronous: the caller's thread polls the child until it exits or the
//! timeout elapses, then the child is killed.

use crate::error::ExecutionError;
use crate::output::{parse_transcript, Payload, Row};
use crate::{Executor, DEFAULT_TIMEOUT};
use shellctl_protocol::{Address, ConnectionDetails};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Poll interval while waiting for the child to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long to keep draining pipes after the child has exited.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Execution mode flag plus the body passed to `--execute`.
#[derive(Debug, Clone, Copy)]
enum Mode<'a> {
    Connect,
    Script(&'a str),
    Sql(&'a str),
}

impl Mode<'_> {
    fn label(&self) -> &'static str {
        match self {
            Mode::Connect => "connect",
            Mode::Script(_) => "script",
            Mode::Sql(_) => "sql",
        }
    }

    fn body_len(&self) -> usize {
        match self {
            Mode::Connect => 0,
            Mode::Script(body) | Mode::Sql(body) => body.len(),
        }
    }
}

/// Outcome of a process that ran to completion.
struct ShellRun {
    status: ExitStatus,
    transcript: String,
}

/// Executor that spawns the management shell on this machine.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    connection: ConnectionDetails,
    shell_path: PathBuf,
}

impl LocalExecutor {
    pub fn new(connection: ConnectionDetails, shell_path: impl Into<PathBuf>) -> Self {
        Self {
            connection,
            shell_path: shell_path.into(),
        }
    }

    pub fn shell_path(&self) -> &Path {
        &self.shell_path
    }

    /// Resolve a bare program name against PATH; explicit paths pass through.
    pub fn resolve_shell_path(&self) -> Result<PathBuf, ExecutionError> {
        if self.shell_path.components().count() > 1 || self.shell_path.is_absolute() {
            return Ok(self.shell_path.clone());
        }
        which::which(&self.shell_path).map_err(|_| {
            ExecutionError::process(format!(
                "'{}' not found on PATH",
                self.shell_path.display()
            ))
        })
    }

    fn common_args() -> [&'static str; 2] {
        ["--json=raw", "--passwords-from-stdin"]
    }

    fn connection_args(&self) -> Vec<String> {
        let mut args = match self.connection.address() {
            Address::Socket(path) => vec![format!("--socket={}", path.display())],
            Address::Tcp { host, port } => {
                vec![format!("--host={}", host), format!("--port={}", port)]
            }
        };
        args.push(format!("--user={}", self.connection.username()));
        args
    }

    fn build_command(&self, program: &Path, mode: Mode<'_>) -> Command {
        let mut cmd = Command::new(program);
        cmd.args(Self::common_args()).args(self.connection_args());

        match mode {
            Mode::Connect => {}
            Mode::Script(code) => {
                cmd.arg("--py").arg("--execute").arg(code);
            }
            Mode::Sql(statement) => {
                cmd.arg("--sql").arg("--execute").arg(statement);
            }
        }

        cmd.stdin(Stdio::piped());
        cmd
    }

    /// Spawn, feed the password, and wait up to `timeout`.
    fn run(&self, mode: Mode<'_>, timeout: Duration) -> Result<ShellRun, ExecutionError> {
        let program = self.resolve_shell_path()?;
        let started = Instant::now();

        debug!(
            shell = %program.display(),
            mode = mode.label(),
            address = %self.connection.address(),
            body_len = mode.body_len(),
            "Spawning management shell"
        );

        let (output, output_writer) = os_pipe::pipe().map_err(|e| {
            ExecutionError::process(format!("failed to create output pipe: {}", e.kind()))
        })?;
        let stderr_writer = output_writer.try_clone().map_err(|e| {
            ExecutionError::process(format!("failed to create output pipe: {}", e.kind()))
        })?;

        let mut cmd = self.build_command(&program, mode);
        cmd.stdout(output_writer).stderr(stderr_writer);
        let spawned = cmd.spawn();
        // The command holds our copies of the write end; the reader only
        // sees EOF once they are gone.
        drop(cmd);
        let mut child = spawned.map_err(|e| {
            ExecutionError::process(format!(
                "failed to spawn {}: {}",
                program.display(),
                e.kind()
            ))
        })?;

        let (tx, rx) = mpsc::channel();
        spawn_reader(output, tx);

        self.send_password(&mut child);

        let mut transcript = Vec::new();
        let status = match wait_with_deadline(&mut child, &rx, &mut transcript, timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                cleanup_process(&mut child);
                warn!(
                    mode = mode.label(),
                    address = %self.connection.address(),
                    timeout_secs = timeout.as_secs_f64(),
                    "Management shell timed out; process killed"
                );
                return Err(ExecutionError::TimedOut { timeout });
            }
            Err(e) => {
                cleanup_process(&mut child);
                return Err(e);
            }
        };

        drain_remaining(&rx, &mut transcript);

        debug!(
            mode = mode.label(),
            exit_code = ?status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            output_len = transcript.len(),
            "Management shell exited"
        );

        Ok(ShellRun {
            status,
            transcript: String::from_utf8_lossy(&transcript).into_owned(),
        })
    }

    fn send_password(&self, child: &mut Child) {
        let Some(mut stdin) = child.stdin.take() else {
            return;
        };
        let written = stdin
            .write_all(self.connection.expose_password().as_bytes())
            .and_then(|_| stdin.write_all(b"\n"))
            .and_then(|_| stdin.flush());
        if let Err(e) = written {
            // The child may exit before reading (e.g. bad arguments); its exit
            // status and output decide the result.
            debug!("Could not write password to management shell: {}", e.kind());
        }
        // stdin dropped here: EOF for the child.
    }
}

impl Executor for LocalExecutor {
    fn connection_details(&self) -> &ConnectionDetails {
        &self.connection
    }

    fn check_connection(&self) -> Result<(), ExecutionError> {
        let run = self.run(Mode::Connect, DEFAULT_TIMEOUT)?;
        if run.status.success() {
            return Ok(());
        }
        let payload = parse_transcript(&run.transcript);
        Err(ExecutionError::failed(payload.sql_error()))
    }

    fn execute_script(&self, code: &str, timeout: Duration) -> Result<String, ExecutionError> {
        let run = self.run(Mode::Script(code), timeout)?;
        let payload = parse_transcript(&run.transcript);
        if !run.status.success() {
            return Err(ExecutionError::failed(payload.script_error()));
        }
        Ok(payload.script_output())
    }

    fn execute_sql(&self, statement: &str, timeout: Duration) -> Result<Vec<Row>, ExecutionError> {
        let run = self.run(Mode::Sql(statement), timeout)?;
        let payload: Payload = parse_transcript(&run.transcript);
        if !run.status.success() {
            return Err(ExecutionError::failed(payload.sql_error()));
        }
        Ok(payload.rows())
    }
}

/// Forward the output pipe line by line into the transcript channel.
fn spawn_reader<R: Read + Send + 'static>(pipe: R, tx: Sender<Vec<u8>>) {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        loop {
            let mut line = Vec::new();
            match reader.read_until(b'\n', &mut line) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
}

/// `None` when `timeout` reaches past what `Instant` can represent; such a
/// wait is treated as unbounded.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Poll until exit (`Some(status)`) or deadline (`None`), collecting output.
fn wait_with_deadline(
    child: &mut Child,
    rx: &Receiver<Vec<u8>>,
    transcript: &mut Vec<u8>,
    timeout: Duration,
) -> Result<Option<ExitStatus>, ExecutionError> {
    let deadline = deadline_after(timeout);
    let mut output_open = true;

    loop {
        if let Some(status) = child.try_wait().map_err(|e| {
            ExecutionError::process(format!("failed to wait for management shell: {}", e.kind()))
        })? {
            return Ok(Some(status));
        }

        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Ok(None);
                }
                POLL_INTERVAL.min(deadline - now)
            }
            None => POLL_INTERVAL,
        };

        if output_open {
            match rx.recv_timeout(wait) {
                Ok(chunk) => transcript.extend_from_slice(&chunk),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => output_open = false,
            }
        } else {
            std::thread::sleep(wait);
        }
    }
}

fn drain_remaining(rx: &Receiver<Vec<u8>>, transcript: &mut Vec<u8>) {
    let Some(deadline) = deadline_after(DRAIN_GRACE) else {
        return;
    };
    loop {
        let now = Instant::now();
        if now >= deadline {
            debug!("Management shell output still open after exit; output may be truncated");
            return;
        }
        match rx.recv_timeout(deadline - now) {
            Ok(chunk) => transcript.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

/// Kill and reap.
fn cleanup_process(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
