//! Export and save requests

use schemars::JsonSchema;
use serde::Deserialize;

/// Request for exporting the current script as an STL mesh
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExportRequest {
    /// Target filename inside the working directory. The ".stl" extension
    /// is appended when absent. Directory components are rejected.
    pub filename: String,
}

/// Request for saving the current script to a .scad file
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SaveScriptRequest {
    /// Target filename inside the working directory. The ".scad" extension
    /// is appended when absent. Directory components are rejected.
    pub filename: String,
}
