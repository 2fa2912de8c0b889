//! End-to-end invariants for the scratchpad core
//!
//! Drives the session store and both pipelines against a scripted fake
//! engine: pipelines always read the latest script, all artifacts stay
//! under the working directory, and failures surface instead of masking.

use std::sync::Arc;
use std::time::Duration;

use scadpad_core::export::{ExportPipeline, EXPORT_SOURCE};
use scadpad_core::render::{RenderPipeline, RENDER_OUTPUT, RENDER_SOURCE};
use scadpad_core::testing::{png_fixture, FakeEngine, FakeRun};
use scadpad_core::{CameraView, Error, SessionStore};
use tempfile::tempdir;

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn render_always_uses_the_latest_persisted_script() {
    let dir = tempdir().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    let engine = FakeEngine::new(FakeRun::WriteFile {
        name: RENDER_OUTPUT.to_string(),
        bytes: png_fixture(1, 1),
    });
    let pipeline = RenderPipeline::new(Arc::new(engine), dir.path(), 512, TIMEOUT);

    store.update_script("cube(1);").unwrap();
    pipeline
        .render(&store.script(), CameraView::Isometric)
        .await
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join(RENDER_SOURCE)).unwrap(),
        "cube(1);"
    );

    store.update_script("cube(2);").unwrap();
    pipeline
        .render(&store.script(), CameraView::Isometric)
        .await
        .unwrap();
    assert_eq!(
        std::fs::read_to_string(dir.path().join(RENDER_SOURCE)).unwrap(),
        "cube(2);"
    );
}

#[tokio::test]
async fn export_lands_under_the_work_dir_with_the_enforced_extension() {
    let dir = tempdir().unwrap();
    let store = SessionStore::open(dir.path()).unwrap();
    store.update_script("cube([5, 5, 5]);").unwrap();

    let engine = FakeEngine::new(FakeRun::WriteFile {
        name: "widget.stl".to_string(),
        bytes: vec![0u8; 684],
    });
    let pipeline = ExportPipeline::new(Arc::new(engine), dir.path(), TIMEOUT);

    let result = pipeline.export(&store.script(), "widget").await.unwrap();

    assert_eq!(result.path, dir.path().join("widget.stl"));
    assert_eq!(result.byte_size, 684);
    assert!(result.path.starts_with(dir.path()));
    assert_eq!(
        std::fs::read_to_string(dir.path().join(EXPORT_SOURCE)).unwrap(),
        "cube([5, 5, 5]);"
    );
}

#[tokio::test]
async fn traversal_export_is_rejected_before_touching_the_filesystem() {
    let dir = tempdir().unwrap();
    let engine = FakeEngine::new(FakeRun::Succeed);
    let calls = engine.calls();
    let pipeline = ExportPipeline::new(Arc::new(engine), dir.path(), TIMEOUT);

    let result = pipeline.export("cube(1);", "../../etc/passwd").await;

    assert!(matches!(result, Err(Error::InvalidFilename { .. })));
    assert!(calls.lock().is_empty());
    // Rejection precedes even the temp source write.
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[tokio::test]
async fn render_and_export_use_distinct_temp_slots() {
    let dir = tempdir().unwrap();

    let render_engine = FakeEngine::new(FakeRun::WriteFile {
        name: RENDER_OUTPUT.to_string(),
        bytes: png_fixture(1, 1),
    });
    let render = RenderPipeline::new(Arc::new(render_engine), dir.path(), 512, TIMEOUT);

    let export_engine = FakeEngine::new(FakeRun::WriteFile {
        name: "part.stl".to_string(),
        bytes: b"solid".to_vec(),
    });
    let export = ExportPipeline::new(Arc::new(export_engine), dir.path(), TIMEOUT);

    render.render("cube(1);", CameraView::Top).await.unwrap();
    export.export("cube(2);", "part").await.unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join(RENDER_SOURCE)).unwrap(),
        "cube(1);"
    );
    assert_eq!(
        std::fs::read_to_string(dir.path().join(EXPORT_SOURCE)).unwrap(),
        "cube(2);"
    );
}
