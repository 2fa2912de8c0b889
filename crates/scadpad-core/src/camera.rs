//! Fixed camera view presets for consistent, predictable renders
//!
//! Provides a set of standard viewing angles that clients can use to get
//! reproducible screenshots from any angle. Unknown view names are rejected
//! here, before any engine invocation.

/// Fixed camera viewing angles
///
/// Each view maps to a fixed OpenSCAD `--camera` eye position looking at the
/// origin; combined with `--viewall --autocenter` the model is framed
/// regardless of its scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraView {
    /// View from front (-Y looking toward origin)
    Front,

    /// View from back (+Y looking toward origin)
    Back,

    /// View from left (-X looking toward origin)
    Left,

    /// View from right (+X looking toward origin)
    Right,

    /// View from above (+Z looking down)
    Top,

    /// View from below (-Z looking up)
    Bottom,

    /// Classic 3/4 isometric view (default)
    #[default]
    Isometric,
}

impl CameraView {
    /// The OpenSCAD `--camera=eyex,eyey,eyez,centerx,centery,centerz`
    /// argument for this view.
    pub fn camera_arg(&self) -> &'static str {
        match self {
            Self::Front => "--camera=0,-40,0,0,0,0",
            Self::Back => "--camera=0,40,0,0,0,0",
            Self::Left => "--camera=-40,0,0,0,0,0",
            Self::Right => "--camera=40,0,0,0,0,0",
            Self::Top => "--camera=0,0,40,0,0,0",
            Self::Bottom => "--camera=0,0,-40,0,0,0",
            Self::Isometric => "--camera=40,-40,32,0,0,0",
        }
    }

    /// Parse a camera view from a string
    ///
    /// Accepts case-insensitive names: "front", "back", "left", "right",
    /// "top", "bottom", "isometric" (or "iso").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "front" => Some(Self::Front),
            "back" => Some(Self::Back),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "top" => Some(Self::Top),
            "bottom" => Some(Self::Bottom),
            "isometric" | "iso" => Some(Self::Isometric),
            _ => None,
        }
    }

    /// Get all available view names
    pub fn all_names() -> &'static [&'static str] {
        &["front", "back", "left", "right", "top", "bottom", "isometric"]
    }
}

impl std::str::FromStr for CameraView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown camera view '{}'. Valid options: {}",
                s,
                Self::all_names().join(", ")
            )
        })
    }
}

impl std::fmt::Display for CameraView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Left => "left",
            Self::Right => "right",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Isometric => "isometric",
        };
        write!(f, "{name}")
    }
}
