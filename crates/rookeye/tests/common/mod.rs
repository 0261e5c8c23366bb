#![allow(dead_code)]

use image::{Rgb, RgbImage};
use nalgebra::Point2;
use rookeye::core::homography_from_4pt;

pub const LIGHT: u8 = 225;
pub const DARK: u8 = 40;
pub const BACKGROUND: u8 = 120;

/// Outer corners of the synthetic board in a 600x560 photo, `[tl, tr, br, bl]`.
pub fn skewed_corners() -> [Point2<f32>; 4] {
    [
        Point2::new(70.0, 60.0),
        Point2::new(520.0, 85.0),
        Point2::new(545.0, 500.0),
        Point2::new(50.0, 470.0),
    ]
}

/// Checkerboard photographed through a known homography. The center of a8
/// (board top-left) carries a red marker.
pub fn render_board(width: u32, height: u32, corners: [Point2<f32>; 4]) -> RgbImage {
    let board = [
        Point2::new(0.0, 0.0),
        Point2::new(8.0, 0.0),
        Point2::new(8.0, 8.0),
        Point2::new(0.0, 8.0),
    ];
    let h_board_from_img = homography_from_4pt(&board, &corners)
        .and_then(|h| h.inverse())
        .expect("board homography");

    RgbImage::from_fn(width, height, |x, y| {
        let b = h_board_from_img.apply(Point2::new(x as f32, y as f32));
        if !(0.0..8.0).contains(&b.x) || !(0.0..8.0).contains(&b.y) {
            return Rgb([BACKGROUND; 3]);
        }
        let (col, row) = (b.x.floor() as usize, b.y.floor() as usize);
        let (fx, fy) = (b.x - col as f32, b.y - row as f32);
        if row == 0 && col == 0 && (0.4..0.6).contains(&fx) && (0.4..0.6).contains(&fy) {
            return Rgb([220, 30, 30]);
        }
        let v = if (row + col) % 2 == 0 { LIGHT } else { DARK };
        Rgb([v; 3])
    })
}

pub fn skewed_photo() -> RgbImage {
    render_board(600, 560, skewed_corners())
}

/// Predictions on an 800 px canvas: kings on e1/e8, a black pawn on a4 and
/// one box that fell off the canvas.
pub const PREDICTIONS_JSON: &str = r#"{
    "predictions": [
        { "x": 450, "y": 750, "width": 70, "height": 90, "class": "8", "confidence": 0.93 },
        { "x": 450, "y": 50, "width": 70, "height": 90, "class": "2", "confidence": 0.91 },
        { "x": 52, "y": 447, "width": 60, "height": 70, "class": "4", "confidence": 0.88 },
        { "x": 905, "y": 120, "width": 60, "height": 70, "class": "10", "confidence": 0.75 }
    ]
}"#;

pub const EXPECTED_PLACEMENT: &str = "4k3/8/8/8/p7/8/8/4K3";
