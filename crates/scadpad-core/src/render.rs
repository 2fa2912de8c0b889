//! Render pipeline: current script -> engine -> transport-ready PNG
//!
//! Stateless per call except for reading the current script, so repeated
//! "look from another angle" calls reuse the same source. The temp source
//! and raster live in a single engine-reserved slot that is overwritten in
//! place; an internal lock serializes overlapping renders.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use tokio::sync::Mutex;

use crate::camera::CameraView;
use crate::error::Error;
use crate::process::EngineRunner;

/// Engine-reserved temp source slot; never collides with user files.
pub const RENDER_SOURCE: &str = ".scadpad_render.scad";

/// Engine-reserved temp raster slot, deleted after every render.
pub const RENDER_OUTPUT: &str = ".scadpad_render.png";

/// MIME type of the encoded render output.
pub const PNG_MIME: &str = "image/png";

/// A transport-ready preview image.
#[derive(Debug, Clone)]
pub struct RenderResult {
    /// Base64-encoded PNG bytes, sized for inclusion in a chat message.
    pub png_base64: String,
    pub width: u32,
    pub height: u32,
}

pub struct RenderPipeline {
    runner: Arc<dyn EngineRunner>,
    work_dir: PathBuf,
    image_size: u32,
    timeout: Duration,
    /// Owns the render temp slot; distinct from the export slot.
    slot: Mutex<()>,
}

impl RenderPipeline {
    pub fn new(
        runner: Arc<dyn EngineRunner>,
        work_dir: impl Into<PathBuf>,
        image_size: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            work_dir: work_dir.into(),
            image_size,
            timeout,
            slot: Mutex::new(()),
        }
    }

    /// Render `script` from the given view into a base64 PNG.
    ///
    /// Rendering failures are deterministic for a given script, so nothing
    /// here retries; the engine's stderr is forwarded for the caller to act
    /// on.
    pub async fn render(&self, script: &str, view: CameraView) -> Result<RenderResult, Error> {
        let _slot = self.slot.lock().await;

        let source = self.work_dir.join(RENDER_SOURCE);
        tokio::fs::write(&source, script)
            .await
            .map_err(|e| Error::io(&source, e))?;

        let args = vec![
            view.camera_arg().to_string(),
            "--viewall".to_string(),
            "--autocenter".to_string(),
            format!("--imgsize={},{}", self.image_size, self.image_size),
            "--render".to_string(),
            "-o".to_string(),
            RENDER_OUTPUT.to_string(),
            RENDER_SOURCE.to_string(),
        ];

        let output = match self.runner.run(&args, &self.work_dir, self.timeout).await {
            Ok(output) => output,
            Err(Error::ExecutionFailed { exit_code, stderr }) => {
                return Err(Error::RenderFailed {
                    reason: format!("engine exited with status {exit_code}"),
                    engine_stderr: stderr,
                });
            }
            Err(e) => return Err(e),
        };

        let raster = self.work_dir.join(RENDER_OUTPUT);
        let png = match tokio::fs::read(&raster).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            _ => {
                return Err(Error::RenderFailed {
                    reason: "engine produced no image".to_string(),
                    engine_stderr: output.stderr,
                });
            }
        };

        let (width, height) = png_dimensions(&png).ok_or_else(|| Error::RenderFailed {
            reason: "engine produced an unreadable image".to_string(),
            engine_stderr: output.stderr.clone(),
        })?;

        // The encoded bytes are the only output; no raster accumulates
        // across renders.
        if let Err(e) = tokio::fs::remove_file(&raster).await {
            tracing::warn!(path = %raster.display(), error = %e, "failed to remove temp raster");
        }

        tracing::debug!(
            %view,
            width,
            height,
            duration_ms = output.duration.as_millis() as u64,
            "render complete"
        );

        Ok(RenderResult {
            png_base64: base64::engine::general_purpose::STANDARD.encode(&png),
            width,
            height,
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

/// Read image dimensions from the PNG header without decoding pixel data.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}
