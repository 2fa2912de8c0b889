//! Shared server state for the MCP tools
//!
//! Bundles the session store, both pipelines, and the engine runner behind
//! one cloneable handle that every tool call goes through. View names and
//! filenames are validated here, before any engine spin-up, and every
//! operation is logged with its parameters, duration, and outcome kind.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use scadpad_core::export::{sanitize_filename, ExportPipeline, ExportResult};
use scadpad_core::render::{RenderPipeline, RenderResult};
use scadpad_core::{
    CameraView, Config, EngineRunner, Error, OpenScadRunner, SessionRecord, SessionStore,
};

/// Timeout for the startup engine availability probe.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the scratchpad state
///
/// Cloneable and Send + Sync; the MCP service clones it per tool call.
#[derive(Clone)]
pub struct ScadpadState {
    inner: Arc<Inner>,
}

struct Inner {
    session: SessionStore,
    render: RenderPipeline,
    export: ExportPipeline,
    runner: Arc<dyn EngineRunner>,
    work_dir: PathBuf,
}

impl ScadpadState {
    /// Create state backed by the real OpenSCAD binary from `config`.
    pub fn new(config: &Config) -> Result<Self, Error> {
        let runner: Arc<dyn EngineRunner> = Arc::new(OpenScadRunner::new(
            config.engine_path.clone(),
            config.max_capture_bytes,
        ));
        Self::with_runner(config, runner)
    }

    /// Create state with an injected engine runner.
    pub fn with_runner(config: &Config, runner: Arc<dyn EngineRunner>) -> Result<Self, Error> {
        let session = SessionStore::open(&config.work_dir)?;
        let render = RenderPipeline::new(
            Arc::clone(&runner),
            &config.work_dir,
            config.image_size,
            config.render_timeout,
        );
        let export = ExportPipeline::new(Arc::clone(&runner), &config.work_dir, config.export_timeout);

        Ok(Self {
            inner: Arc::new(Inner {
                session,
                render,
                export,
                runner,
                work_dir: config.work_dir.clone(),
            }),
        })
    }

    /// Path of the persisted session document.
    pub fn state_path(&self) -> &Path {
        self.inner.session.path()
    }

    /// Current script text, without logging. Used for empty-scratchpad
    /// short-circuits.
    pub fn script(&self) -> String {
        self.inner.session.script()
    }

    /// Current script text, logged as a tool invocation.
    pub fn show_script(&self) -> String {
        let script = self.inner.session.script();
        tracing::info!(op = "show_script", chars = script.len(), outcome = "ok");
        script
    }

    /// Replace the scratchpad script and persist it.
    pub fn update_script(&self, content: &str) -> Result<SessionRecord, Error> {
        let start = Instant::now();
        let result = self.inner.session.update_script(content);
        log_outcome(
            "create_script",
            &format!("{} chars", content.len()),
            start,
            result.as_ref().err(),
        );
        result
    }

    /// Render the current script from the named view.
    pub async fn render(&self, view_name: &str) -> Result<RenderResult, Error> {
        let start = Instant::now();
        let result = self.render_inner(view_name).await;
        log_outcome("render", view_name, start, result.as_ref().err());
        result
    }

    async fn render_inner(&self, view_name: &str) -> Result<RenderResult, Error> {
        let view = CameraView::parse(view_name).ok_or_else(|| Error::InvalidView {
            name: view_name.to_string(),
            valid: CameraView::all_names().join(", "),
        })?;
        let script = self.inner.session.script();
        self.inner.render.render(&script, view).await
    }

    /// Export the current script as an STL mesh.
    pub async fn export(&self, filename: &str) -> Result<ExportResult, Error> {
        let start = Instant::now();
        let script = self.inner.session.script();
        let result = self.inner.export.export(&script, filename).await;
        log_outcome("export", filename, start, result.as_ref().err());
        result
    }

    /// Save the current script to a .scad file in the working directory.
    pub fn save_script(&self, filename: &str) -> Result<PathBuf, Error> {
        let start = Instant::now();
        let result = self.save_script_inner(filename);
        log_outcome("save_script", filename, start, result.as_ref().err());
        result
    }

    fn save_script_inner(&self, filename: &str) -> Result<PathBuf, Error> {
        let name = sanitize_filename(filename, "scad")?;
        let path = self.inner.work_dir.join(name);
        std::fs::write(&path, self.inner.session.script()).map_err(|e| Error::io(&path, e))?;
        Ok(path)
    }

    /// Probe the engine binary once at startup. Failure is reported, not
    /// fatal.
    pub async fn probe_engine(&self) -> Result<String, Error> {
        let output = self
            .inner
            .runner
            .run(
                &["--version".to_string()],
                &self.inner.work_dir,
                PROBE_TIMEOUT,
            )
            .await?;

        // OpenSCAD prints its version banner to stderr
        let text = if output.stderr.trim().is_empty() {
            output.stdout
        } else {
            output.stderr
        };
        Ok(text.trim().to_string())
    }
}

fn log_outcome(op: &str, params: &str, start: Instant, error: Option<&Error>) {
    let duration_ms = start.elapsed().as_millis() as u64;
    match error {
        None => tracing::info!(op, params, duration_ms, outcome = "ok"),
        Some(e) => tracing::warn!(op, params, duration_ms, outcome = e.kind(), error = %e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scadpad_core::render::RENDER_OUTPUT;
    use scadpad_core::testing::{png_fixture, FakeEngine, FakeRun};
    use tempfile::tempdir;

    fn config(dir: &Path) -> Config {
        Config {
            work_dir: dir.to_path_buf(),
            ..Config::default()
        }
    }

    fn state_with(dir: &Path, engine: FakeEngine) -> (ScadpadState, Arc<parking_lot::Mutex<Vec<Vec<String>>>>) {
        let calls = engine.calls();
        let state = ScadpadState::with_runner(&config(dir), Arc::new(engine)).unwrap();
        (state, calls)
    }

    #[tokio::test]
    async fn unknown_view_is_rejected_without_invoking_the_engine() {
        let dir = tempdir().unwrap();
        let (state, calls) = state_with(dir.path(), FakeEngine::new(FakeRun::Succeed));
        state.update_script("cube(1);").unwrap();

        let result = state.render("diagonal").await;

        match result {
            Err(Error::InvalidView { name, valid }) => {
                assert_eq!(name, "diagonal");
                assert!(valid.contains("isometric"));
            }
            other => panic!("expected InvalidView, got {other:?}"),
        }
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn traversal_filename_is_rejected_without_invoking_the_engine() {
        let dir = tempdir().unwrap();
        let (state, calls) = state_with(dir.path(), FakeEngine::new(FakeRun::Succeed));
        state.update_script("cube(1);").unwrap();

        let result = state.export("../../etc/passwd").await;

        assert!(matches!(result, Err(Error::InvalidFilename { .. })));
        assert!(calls.lock().is_empty());
    }

    #[tokio::test]
    async fn sequential_renders_reuse_the_stored_script() {
        let dir = tempdir().unwrap();
        let (state, calls) = state_with(
            dir.path(),
            FakeEngine::new(FakeRun::WriteFile {
                name: RENDER_OUTPUT.to_string(),
                bytes: png_fixture(1, 1),
            }),
        );
        state.update_script("cube([2, 3, 4]);").unwrap();

        state.render("front").await.unwrap();
        state.render("top").await.unwrap();

        let calls = calls.lock();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0][0], calls[1][0], "views must map to distinct cameras");
        // The script itself was neither resupplied nor mutated.
        assert_eq!(state.script(), "cube([2, 3, 4]);");
    }

    #[tokio::test]
    async fn update_then_show_round_trips() {
        let dir = tempdir().unwrap();
        let (state, _) = state_with(dir.path(), FakeEngine::new(FakeRun::Succeed));

        let script = "union() { cube(1); sphere(2); }";
        state.update_script(script).unwrap();
        assert_eq!(state.show_script(), script);
    }

    #[tokio::test]
    async fn save_script_appends_the_scad_extension() {
        let dir = tempdir().unwrap();
        let (state, _) = state_with(dir.path(), FakeEngine::new(FakeRun::Succeed));
        state.update_script("cube(7);").unwrap();

        let path = state.save_script("mypart").unwrap();

        assert_eq!(path, dir.path().join("mypart.scad"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "cube(7);");
    }

    #[tokio::test]
    async fn probe_invokes_the_engine_with_version_only() {
        let dir = tempdir().unwrap();
        let (state, calls) = state_with(dir.path(), FakeEngine::new(FakeRun::Succeed));

        state.probe_engine().await.unwrap();

        let calls = calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["--version".to_string()]);
    }
}
