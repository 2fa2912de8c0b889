//! Export pipeline: current script -> engine -> solid mesh file
//!
//! The target filename is sanitized before anything touches the process
//! layer; the produced file lands under the working directory, overwriting
//! any prior export of the same name. An empty output file is a silent
//! engine failure and is reported as such.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use crate::error::Error;
use crate::process::EngineRunner;

/// Engine-reserved temp source slot, distinct from the render slot so an
/// export may proceed concurrently with a render.
pub const EXPORT_SOURCE: &str = ".scadpad_export.scad";

/// Extension enforced on exported mesh files.
pub const MESH_EXTENSION: &str = "stl";

/// Prefix reserved for the engine temp slots; user filenames must not
/// shadow it.
const RESERVED_PREFIX: &str = ".scadpad_";

/// A completed mesh export.
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub path: PathBuf,
    pub byte_size: u64,
}

pub struct ExportPipeline {
    runner: Arc<dyn EngineRunner>,
    work_dir: PathBuf,
    timeout: Duration,
    /// Owns the export temp slot.
    slot: Mutex<()>,
}

impl ExportPipeline {
    pub fn new(
        runner: Arc<dyn EngineRunner>,
        work_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            work_dir: work_dir.into(),
            timeout,
            slot: Mutex::new(()),
        }
    }

    /// Export `script` as a binary STL under the working directory.
    pub async fn export(&self, script: &str, filename: &str) -> Result<ExportResult, Error> {
        let filename = sanitize_filename(filename, MESH_EXTENSION)?;

        let _slot = self.slot.lock().await;

        let source = self.work_dir.join(EXPORT_SOURCE);
        tokio::fs::write(&source, script)
            .await
            .map_err(|e| Error::io(&source, e))?;

        let args = vec![
            "--render".to_string(),
            "-o".to_string(),
            filename.clone(),
            EXPORT_SOURCE.to_string(),
        ];

        let output = match self.runner.run(&args, &self.work_dir, self.timeout).await {
            Ok(output) => output,
            Err(Error::ExecutionFailed { exit_code, stderr }) => {
                // Non-manifold geometry lands here; the engine's diagnostic
                // is forwarded verbatim rather than re-diagnosed locally.
                return Err(Error::ExportFailed {
                    reason: format!("engine exited with status {exit_code}"),
                    engine_stderr: stderr,
                });
            }
            Err(e) => return Err(e),
        };

        let path = self.work_dir.join(&filename);
        let byte_size = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.len(),
            Err(_) => {
                return Err(Error::ExportFailed {
                    reason: "engine produced no mesh file".to_string(),
                    engine_stderr: output.stderr,
                });
            }
        };

        if byte_size == 0 {
            return Err(Error::ExportFailed {
                reason: "engine produced an empty mesh file".to_string(),
                engine_stderr: output.stderr,
            });
        }

        tracing::debug!(
            path = %path.display(),
            byte_size,
            duration_ms = output.duration.as_millis() as u64,
            "export complete"
        );

        Ok(ExportResult { path, byte_size })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

/// Validate a user-supplied filename and enforce `extension`.
///
/// Rejects rather than rewrites: directory components, traversal, the
/// engine-reserved temp namespace, and characters outside
/// `[A-Za-z0-9._- ]` all fail with `InvalidFilename`.
pub fn sanitize_filename(name: &str, extension: &str) -> Result<String, Error> {
    let reject = |reason: &str| Error::InvalidFilename {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(reject("empty filename"));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(reject("path separators are not allowed"));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(reject("not a filename"));
    }
    if trimmed.starts_with(RESERVED_PREFIX) {
        return Err(reject("the .scadpad_ prefix is reserved"));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | ' ')))
    {
        return Err(reject(&format!("unsupported character {bad:?}")));
    }

    let suffix = format!(".{extension}");
    if trimmed.to_lowercase().ends_with(&suffix) {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{trimmed}{suffix}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEngine, FakeRun};
    use tempfile::tempdir;

    fn pipeline(dir: &Path, engine: FakeEngine) -> ExportPipeline {
        ExportPipeline::new(Arc::new(engine), dir, Duration::from_secs(5))
    }

    #[test]
    fn sanitize_appends_the_extension() {
        assert_eq!(sanitize_filename("part", "stl").unwrap(), "part.stl");
        assert_eq!(sanitize_filename("part.stl", "stl").unwrap(), "part.stl");
        assert_eq!(sanitize_filename("Part.STL", "stl").unwrap(), "Part.STL");
        assert_eq!(sanitize_filename("part.v2", "stl").unwrap(), "part.v2.stl");
        assert_eq!(sanitize_filename("my part", "scad").unwrap(), "my part.scad");
    }

    #[test]
    fn sanitize_rejects_traversal_and_junk() {
        for bad in [
            "../../etc/passwd",
            "sub/part.stl",
            "sub\\part.stl",
            "..",
            ".",
            "",
            "   ",
            "part|v2",
            "pa\nrt",
            ".scadpad_render.scad",
        ] {
            let result = sanitize_filename(bad, "stl");
            assert!(
                matches!(result, Err(Error::InvalidFilename { .. })),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[tokio::test]
    async fn exports_a_nonempty_mesh_under_the_work_dir() {
        let dir = tempdir().unwrap();
        let engine = FakeEngine::new(FakeRun::WriteFile {
            name: "cube.stl".to_string(),
            bytes: b"solid cube".to_vec(),
        });

        let result = pipeline(dir.path(), engine)
            .export("cube(5);", "cube")
            .await
            .unwrap();

        assert_eq!(result.path, dir.path().join("cube.stl"));
        assert_eq!(result.byte_size, 10);
        assert!(result.path.starts_with(dir.path()));

        let source = std::fs::read_to_string(dir.path().join(EXPORT_SOURCE)).unwrap();
        assert_eq!(source, "cube(5);");
    }

    #[tokio::test]
    async fn traversal_filename_is_rejected_before_any_invocation() {
        let dir = tempdir().unwrap();
        let engine = FakeEngine::new(FakeRun::Succeed);
        let calls = engine.calls();

        let result = pipeline(dir.path(), engine)
            .export("cube(5);", "../../etc/passwd")
            .await;

        assert!(matches!(result, Err(Error::InvalidFilename { .. })));
        assert!(calls.lock().is_empty());
        assert!(!dir.path().join(EXPORT_SOURCE).exists());
    }

    #[tokio::test]
    async fn empty_output_file_is_a_reported_failure() {
        let dir = tempdir().unwrap();
        let engine = FakeEngine::new(FakeRun::WriteFile {
            name: "cube.stl".to_string(),
            bytes: Vec::new(),
        });

        let result = pipeline(dir.path(), engine).export("cube(5);", "cube").await;

        assert!(matches!(
            result,
            Err(Error::ExportFailed { reason, .. }) if reason.contains("empty")
        ));
    }

    #[tokio::test]
    async fn missing_output_file_is_a_reported_failure() {
        let dir = tempdir().unwrap();
        let engine = FakeEngine::new(FakeRun::Succeed);

        let result = pipeline(dir.path(), engine).export("cube(5);", "cube").await;

        assert!(matches!(
            result,
            Err(Error::ExportFailed { reason, .. }) if reason.contains("no mesh file")
        ));
    }

    #[tokio::test]
    async fn manifold_diagnostics_are_forwarded_verbatim() {
        let dir = tempdir().unwrap();
        let engine = FakeEngine::new(FakeRun::ExitNonZero {
            exit_code: 1,
            stderr: "ERROR: Object isn't a valid 2-manifold!".to_string(),
        });

        let result = pipeline(dir.path(), engine).export("bad();", "part").await;

        match result {
            Err(Error::ExportFailed { engine_stderr, .. }) => {
                assert!(engine_stderr.contains("2-manifold"));
            }
            other => panic!("expected ExportFailed, got {other:?}"),
        }
    }
}
