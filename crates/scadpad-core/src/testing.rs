//! Test doubles for the engine runner seam
//!
//! Used by unit and integration tests to script engine behavior and to
//! assert how (or whether) the engine was invoked.

#![allow(clippy::expect_used)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::Error;
use crate::process::{EngineRunner, ProcessOutput};

/// Scripted behavior for a [`FakeEngine`] invocation.
#[derive(Debug, Clone)]
pub enum FakeRun {
    /// Exit 0 without touching the filesystem.
    Succeed,
    /// Exit 0 after writing `bytes` to `name` under the work dir.
    WriteFile { name: String, bytes: Vec<u8> },
    /// Exit non-zero with the given stderr.
    ExitNonZero { exit_code: i32, stderr: String },
    /// Simulate deadline expiry.
    TimeOut,
}

/// An [`EngineRunner`] double that records every invocation's args.
pub struct FakeEngine {
    behavior: FakeRun,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl FakeEngine {
    pub fn new(behavior: FakeRun) -> Self {
        Self {
            behavior,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded invocation args, one entry per run.
    pub fn calls(&self) -> Arc<Mutex<Vec<Vec<String>>>> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl EngineRunner for FakeEngine {
    async fn run(
        &self,
        args: &[String],
        work_dir: &Path,
        timeout: Duration,
    ) -> Result<ProcessOutput, Error> {
        self.calls.lock().push(args.to_vec());

        match &self.behavior {
            FakeRun::Succeed => Ok(empty_output()),
            FakeRun::WriteFile { name, bytes } => {
                let path = work_dir.join(name);
                std::fs::write(&path, bytes).map_err(|e| Error::io(&path, e))?;
                Ok(empty_output())
            }
            FakeRun::ExitNonZero { exit_code, stderr } => Err(Error::ExecutionFailed {
                exit_code: *exit_code,
                stderr: stderr.clone(),
            }),
            FakeRun::TimeOut => Err(Error::TimedOut {
                timeout_secs: timeout.as_secs(),
            }),
        }
    }
}

fn empty_output() -> ProcessOutput {
    ProcessOutput {
        stdout: String::new(),
        stderr: String::new(),
        duration: Duration::ZERO,
    }
}

/// Encode a `width` x `height` RGBA PNG for use as an engine output fixture.
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    image::DynamicImage::new_rgba8(width, height)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode fixture png");
    bytes
}
