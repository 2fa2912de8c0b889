//! Scadpad core - session and render orchestration for the OpenSCAD
//! scratchpad
//!
//! Owns the single-document scratchpad whose content drives the external
//! OpenSCAD process:
//!
//! - [`session`] persists the current script across restarts
//! - [`process`] invokes the engine under a hard wall-clock timeout
//! - [`render`] turns the script into a transport-ready preview image
//! - [`export`] turns the script into a solid mesh file
//!
//! The engine is a black box reached only through [`process::EngineRunner`];
//! nothing here parses OpenSCAD's language or computes geometry.

pub mod camera;
pub mod config;
pub mod error;
pub mod export;
pub mod process;
pub mod render;
pub mod session;
pub mod testing;

pub use camera::CameraView;
pub use config::Config;
pub use error::Error;
pub use export::{ExportPipeline, ExportResult};
pub use process::{EngineRunner, OpenScadRunner, ProcessOutput};
pub use render::{RenderPipeline, RenderResult, PNG_MIME};
pub use session::{SessionRecord, SessionStore};
