//! Runtime configuration resolved from environment variables.
//!
//! A single variable (`SCADPAD_WORK_DIR`) selects the working directory; the
//! remaining knobs cover the deliberately-configurable bounds: engine binary,
//! per-operation timeouts, render resolution, and the output capture cap.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Working directory for the scratchpad state, temp sources, and exports.
pub const WORK_DIR_ENV: &str = "SCADPAD_WORK_DIR";

/// Path or name of the OpenSCAD binary.
pub const ENGINE_ENV: &str = "SCADPAD_OPENSCAD";

/// Render timeout in seconds.
pub const RENDER_TIMEOUT_ENV: &str = "SCADPAD_RENDER_TIMEOUT_SECS";

/// Export timeout in seconds. Mesh generation is costlier than previews.
pub const EXPORT_TIMEOUT_ENV: &str = "SCADPAD_EXPORT_TIMEOUT_SECS";

/// Square render resolution in pixels.
pub const IMAGE_SIZE_ENV: &str = "SCADPAD_IMAGE_SIZE";

/// Cap on captured stdout/stderr bytes per invocation.
pub const MAX_CAPTURE_ENV: &str = "SCADPAD_MAX_CAPTURE_BYTES";

#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: PathBuf,
    pub engine_path: String,
    pub render_timeout: Duration,
    pub export_timeout: Duration,
    pub image_size: u32,
    pub max_capture_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            engine_path: "openscad".to_string(),
            render_timeout: Duration::from_secs(30),
            export_timeout: Duration::from_secs(60),
            image_size: 1024,
            max_capture_bytes: 2 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Resolve the configuration from the process environment, falling back
    /// to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: env::var_os(WORK_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            engine_path: env::var(ENGINE_ENV).unwrap_or(defaults.engine_path),
            render_timeout: env_secs(RENDER_TIMEOUT_ENV).unwrap_or(defaults.render_timeout),
            export_timeout: env_secs(EXPORT_TIMEOUT_ENV).unwrap_or(defaults.export_timeout),
            image_size: env_parse(IMAGE_SIZE_ENV).unwrap_or(defaults.image_size),
            max_capture_bytes: env_parse(MAX_CAPTURE_ENV).unwrap_or(defaults.max_capture_bytes),
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok()?.trim().parse().ok()
}
