//! Process invocation layer for the OpenSCAD engine
//!
//! Runs the engine as a subprocess with a hard wall-clock timeout, captures
//! stdout/stderr with a bounded buffer, and classifies failures by exit
//! status. The engine's diagnostic text is never interpreted here.
//!
//! The [`EngineRunner`] trait is the seam the pipelines are built against;
//! tests inject doubles to observe (or suppress) invocations.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

use crate::error::Error;

/// Marker appended to captured output that exceeded the buffer cap.
const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// Captured result of a successful engine invocation.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Invokes the external engine with a bounded wall-clock deadline.
#[async_trait]
pub trait EngineRunner: Send + Sync {
    /// Run the engine with `args` inside `work_dir`.
    ///
    /// On deadline expiry the spawned process (and its process group) is
    /// forcibly terminated and `TimedOut` is returned. A non-zero exit
    /// status is returned as `ExecutionFailed` with the captured stderr.
    async fn run(
        &self,
        args: &[String],
        work_dir: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, Error>;
}

/// Production runner invoking the real OpenSCAD binary.
pub struct OpenScadRunner {
    program: String,
    max_capture_bytes: usize,
}

impl OpenScadRunner {
    pub fn new(program: impl Into<String>, max_capture_bytes: usize) -> Self {
        Self {
            program: program.into(),
            max_capture_bytes,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl EngineRunner for OpenScadRunner {
    async fn run(
        &self,
        args: &[String],
        work_dir: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, Error> {
        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so a timeout kill takes any children with it
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::EngineNotFound {
                    program: self.program.clone(),
                }
            } else {
                Error::io(work_dir, e)
            }
        })?;

        let cap = self.max_capture_bytes;
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_task = tokio::spawn(async move {
            match stdout_pipe {
                Some(pipe) => read_capped(pipe, cap).await,
                None => Ok(String::new()),
            }
        });
        let stderr_task = tokio::spawn(async move {
            match stderr_pipe {
                Some(pipe) => read_capped(pipe, cap).await,
                None => Ok(String::new()),
            }
        });

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(Error::io(work_dir, e)),
            Err(_) => {
                kill_process_group(&mut child).await;
                return Err(Error::TimedOut {
                    timeout_secs: timeout.as_secs(),
                });
            }
        };

        let stdout = join_capture(stdout_task, work_dir).await?;
        let stderr = join_capture(stderr_task, work_dir).await?;

        if !status.success() {
            return Err(Error::ExecutionFailed {
                exit_code: status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(ProcessOutput {
            stdout,
            stderr,
            duration: start.elapsed(),
        })
    }
}

async fn join_capture(
    task: tokio::task::JoinHandle<std::io::Result<String>>,
    work_dir: &Path,
) -> Result<String, Error> {
    match task.await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(Error::io(work_dir, e)),
        Err(e) => Err(Error::io(work_dir, std::io::Error::other(e))),
    }
}

/// Read a pipe to EOF, keeping at most `cap` bytes.
///
/// Drains past the cap so the child never blocks on a full pipe; appends a
/// truncation marker when anything was dropped.
async fn read_capped<R>(mut reader: R, cap: usize) -> std::io::Result<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if buf.len() < cap {
            let take = n.min(cap - buf.len());
            buf.extend_from_slice(&chunk[..take]);
            if take < n {
                truncated = true;
            }
        } else {
            truncated = true;
        }
    }

    let mut text = String::from_utf8_lossy(&buf).into_owned();
    if truncated {
        text.push_str(TRUNCATION_MARKER);
    }
    Ok(text)
}

/// Forcibly terminate the child and, on unix, its whole process group.
async fn kill_process_group(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // The child was spawned as its own group leader (process_group(0)),
        // so its pid doubles as the pgid.
        #[allow(unsafe_code)]
        unsafe {
            libc::killpg(pid as i32, libc::SIGKILL);
        }
    }

    if let Err(e) = child.kill().await {
        tracing::warn!(error = %e, "failed to kill timed-out engine process");
    }
    let _ = child.wait().await;
}
