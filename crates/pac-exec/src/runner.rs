// runner.rs — Run one external process under a wall-clock timeout.
//
// Both output pipes are drained concurrently with waiting for exit; draining
// them one after the other can deadlock once either OS pipe buffer fills.
// A timed-out child is killed and reaped before `execute` returns, so no
// zombie ever outlives a call.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::error::ExecError;

/// Default wall-clock limit when the caller does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// One external command invocation. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Duration,
}

impl ExecutionRequest {
    /// Build a request for `program` with a structured argument vector.
    /// Arguments are passed to the spawn primitive directly — never through
    /// a shell — so no quoting or escaping applies at this layer.
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the working directory (defaults to the current directory).
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set the wall-clock timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// The complete outcome of one [`ExecutionRequest`].
///
/// `success` is derived from the exit code, never stored separately.
/// A timeout is encoded as exit code `-1` with a synthetic stderr message,
/// keeping it uniform with ordinary command failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    fn timed_out(timeout: Duration) -> Self {
        Self {
            exit_code: -1,
            stdout: String::new(),
            stderr: format!("command timed out after {:?}", timeout),
        }
    }
}

/// Run the request to completion and capture its output.
///
/// Never errors on a non-zero exit code — inspect
/// [`ExecutionResult::success`]. Errors are reserved for spawn and pipe
/// failures; a missing binary should already have been caught by
/// [`resolve`](crate::resolve) before this point.
pub async fn execute(request: &ExecutionRequest) -> Result<ExecutionResult, ExecError> {
    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &request.cwd {
        cmd.current_dir(dir);
    }

    tracing::debug!(
        program = %request.program.display(),
        args = ?request.args,
        timeout = ?request.timeout,
        "spawning process"
    );

    let mut child = cmd.spawn().map_err(|source| ExecError::Launch {
        program: request.program.display().to_string(),
        source,
    })?;

    // Take both pipes before waiting so they can be drained concurrently
    // with (and independently of) the exit status.
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let run = async {
        let (out, err, status) = tokio::join!(
            drain(&mut stdout_pipe, &mut stdout_buf),
            drain(&mut stderr_pipe, &mut stderr_buf),
            child.wait(),
        );
        out?;
        err?;
        status
    };

    let outcome = tokio::time::timeout(request.timeout, run).await;
    match outcome {
        Ok(Ok(status)) => Ok(ExecutionResult {
            exit_code: status.code().unwrap_or(-1),
            stdout: decode(&stdout_buf),
            stderr: decode(&stderr_buf),
        }),
        Ok(Err(source)) => Err(ExecError::Io(source)),
        Err(_elapsed) => {
            tracing::warn!(
                program = %request.program.display(),
                timeout = ?request.timeout,
                "process timed out, killing"
            );
            // kill() also reaps the child, releasing resources exactly as
            // on the success path.
            let _ = child.kill().await;
            Ok(ExecutionResult::timed_out(request.timeout))
        }
    }
}

async fn drain(
    pipe: &mut Option<impl AsyncReadExt + Unpin>,
    buf: &mut Vec<u8>,
) -> std::io::Result<()> {
    if let Some(pipe) = pipe.as_mut() {
        pipe.read_to_end(buf).await?;
    }
    Ok(())
}

/// Lossy UTF-8 decode (invalid sequences become U+FFFD) plus trim.
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
