//! Rendering requests

use schemars::JsonSchema;
use serde::Deserialize;

fn default_view() -> String {
    "isometric".to_string()
}

/// Request for rendering the current script to a preview image
#[derive(Debug, Deserialize, JsonSchema)]
pub struct RenderRequest {
    /// Camera view.
    /// Options: "front", "back", "left", "right", "top", "bottom",
    /// "isometric" (default)
    #[serde(default = "default_view")]
    pub view: String,
}
