use serde::{Deserialize, Serialize};

/// Parameters of the board outline detector.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BoardDetectorParams {
    /// Longest image side used for edge detection; larger photographs are
    /// downscaled first and corners mapped back. `0` disables downscaling.
    pub max_side_px: u32,

    /// Extra Gaussian blur before Canny (Canny smooths on its own). `0` disables it.
    pub blur_sigma: f32,

    /// Canny hysteresis thresholds on the gradient magnitude.
    pub canny_low: f32,
    pub canny_high: f32,

    /// Chebyshev radius used to close gaps in the edge map.
    pub dilate_radius: u8,

    /// Douglas-Peucker tolerances relative to the contour perimeter, tried in
    /// order until a contour collapses to 4 vertices.
    pub approx_epsilons: Vec<f64>,

    /// Vertices turning by less than this angle are dropped as collinear.
    pub collinear_tolerance_deg: f32,

    /// Minimal board area as a fraction of the image area.
    pub min_area_frac: f32,

    /// Minimal ratio between the shortest and the longest board side.
    pub min_side_ratio: f32,

    /// Minimal ratio between quad area and traced contour area (either way).
    pub min_fill_ratio: f32,

    /// Sample the 8x8 cells inside each candidate and require a light/dark
    /// alternation before accepting it as the board.
    pub verify_checkerboard: bool,

    /// Minimal gray-level gap between the mean light and mean dark cell.
    pub min_checker_contrast: f32,

    /// Minimal fraction of the 64 cells whose brightness matches their
    /// checkerboard parity. Pieces cover part of the cells, so this is below 1.
    pub min_checker_agreement: f32,
}

impl Default for BoardDetectorParams {
    fn default() -> Self {
        Self {
            max_side_px: 1024,
            blur_sigma: 1.0,
            canny_low: 30.0,
            canny_high: 90.0,
            dilate_radius: 2,
            approx_epsilons: vec![0.01, 0.02, 0.03],
            collinear_tolerance_deg: 12.0,
            min_area_frac: 0.05,
            min_side_ratio: 0.3,
            min_fill_ratio: 0.85,
            verify_checkerboard: true,
            min_checker_contrast: 25.0,
            min_checker_agreement: 0.75,
        }
    }
}

/// Parameters of the perspective rectifier.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RectifyParams {
    /// Side of the square output canvas in pixels.
    pub size_px: u32,
}

impl Default for RectifyParams {
    fn default() -> Self {
        Self { size_px: 800 }
    }
}
