//! Script management requests

use schemars::JsonSchema;
use serde::Deserialize;

/// Request for creating or replacing the scratchpad script
#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateScriptRequest {
    /// Full OpenSCAD script content. Replaces whatever is currently in the
    /// scratchpad; subsequent render and export calls use this script.
    ///
    /// Example:
    /// ```scad
    /// difference() {
    ///     cube([20, 20, 10], center = true);
    ///     cylinder(h = 12, r = 5, center = true);
    /// }
    /// ```
    pub content: String,
}
