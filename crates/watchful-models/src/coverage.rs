//! How much of the screen the player surface covers.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Width and height in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurfaceSize {
    pub width: f64,
    pub height: f64,
}

impl SurfaceSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Percentage of the available screen covered by the player (0-100+).
///
/// Takes the larger of the width and height ratios, so a full-width
/// letterboxed player reports 100. Returns 0 for a degenerate screen.
pub fn display_coverage(surface: SurfaceSize, screen: SurfaceSize) -> u32 {
    if screen.width <= 0.0 || screen.height <= 0.0 {
        return 0;
    }

    let width_pct = surface.width.max(0.0) / screen.width * 100.0;
    let height_pct = surface.height.max(0.0) / screen.height * 100.0;
    let coverage = width_pct.max(height_pct);

    if coverage.is_finite() {
        coverage.round() as u32
    } else {
        0
    }
}
