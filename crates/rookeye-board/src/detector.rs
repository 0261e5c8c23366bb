//! Board outline detection: edge map -> contours -> convex quadrilaterals.

use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use log::debug;
use nalgebra::Point2;
use rookeye_core::{
    homography_from_4pt, sample_bilinear, BoardQuad, ImageView, BOARD_DIM, NUM_SQUARES,
};
use serde::{Deserialize, Serialize};

use crate::BoardDetectorParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Reasons the board outline could not be found.
///
/// Every variant is a detection failure: retrying on the same image with the
/// same parameters gives the same result.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DetectError {
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("no edges found in the image")]
    NoContours,
    #[error("no board-like quadrilateral among {contours} contours")]
    NoQuadrilateral { contours: usize },
    #[error("largest quadrilateral covers {area_frac:.3} of the image (need >= {min_area_frac:.3})")]
    BoardTooSmall { area_frac: f32, min_area_frac: f32 },
    #[error("{candidates} large quadrilaterals found but none encloses an 8x8 checkerboard (best cell agreement {best_agreement:.2})")]
    NotACheckerboard {
        candidates: usize,
        best_agreement: f32,
    },
}

/// Detected board outline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardDetection {
    /// Outer corners in full-resolution pixels, clockwise from top-left.
    pub corners: BoardQuad,
    /// Board area divided by image area.
    pub area_frac: f32,
    /// Quad area divided by the traced contour area.
    pub fill_ratio: f32,
    /// Number of traced contours and of those that passed every quad check.
    pub num_contours: usize,
    pub num_candidates: usize,
    /// Fraction of cells matching the light/dark alternation (1.0 when
    /// verification is disabled).
    pub checker_agreement: f32,
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    quad: BoardQuad,
    area: f32,
    fill_ratio: f32,
}

/// Locates the outer outline of a chessboard in a grayscale photograph.
pub struct BoardDetector {
    params: BoardDetectorParams,
}

impl BoardDetector {
    pub fn new(params: BoardDetectorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BoardDetectorParams {
        &self.params
    }

    /// Find the board corners or explain why none qualify.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, img), fields(width = img.width(), height = img.height()))
    )]
    pub fn detect(&self, img: &GrayImage) -> Result<BoardDetection, DetectError> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            return Err(DetectError::EmptyImage { width, height });
        }

        let (work, scale) = downscale(img, self.params.max_side_px);
        let edges = self.edge_map(&work);

        let contours = find_contours::<i32>(&edges);
        debug!(
            "edge map {}x{}: {} contours (scale {:.3})",
            work.width(),
            work.height(),
            contours.len(),
            scale
        );
        if contours.is_empty() {
            return Err(DetectError::NoContours);
        }

        let image_area = work.width() as f32 * work.height() as f32;
        let mut candidates: Vec<Candidate> = contours
            .iter()
            .filter_map(|c| self.quad_candidate(&c.points))
            .collect();
        candidates.sort_by(|a, b| b.area.total_cmp(&a.area));

        let Some(largest) = candidates.first() else {
            return Err(DetectError::NoQuadrilateral {
                contours: contours.len(),
            });
        };
        let largest_frac = largest.area / image_area;
        if largest_frac < self.params.min_area_frac {
            return Err(DetectError::BoardTooSmall {
                area_frac: largest_frac,
                min_area_frac: self.params.min_area_frac,
            });
        }

        // Candidates are sorted by area; the first one enclosing a checkerboard wins.
        let mut rejected = 0usize;
        let mut best_agreement = 0.0f32;
        for cand in &candidates {
            let area_frac = cand.area / image_area;
            if area_frac < self.params.min_area_frac {
                break;
            }
            let agreement = if self.params.verify_checkerboard {
                checker_agreement(&work, &cand.quad, self.params.min_checker_contrast)
                    .unwrap_or(0.0)
            } else {
                1.0
            };
            if agreement < self.params.min_checker_agreement {
                debug!(
                    "quad {:?} rejected: checker agreement {:.2}",
                    cand.quad.to_array(),
                    agreement
                );
                rejected += 1;
                best_agreement = best_agreement.max(agreement);
                continue;
            }

            let corners = rescale_quad(&cand.quad, scale);
            debug!(
                "board quad {:?} area_frac={:.3} fill={:.3} agreement={:.2} ({} candidates)",
                corners.to_array(),
                area_frac,
                cand.fill_ratio,
                agreement,
                candidates.len()
            );
            return Ok(BoardDetection {
                corners,
                area_frac,
                fill_ratio: cand.fill_ratio,
                num_contours: contours.len(),
                num_candidates: candidates.len(),
                checker_agreement: agreement,
            });
        }

        Err(DetectError::NotACheckerboard {
            candidates: rejected,
            best_agreement,
        })
    }

    fn edge_map(&self, img: &GrayImage) -> GrayImage {
        let p = &self.params;
        let smoothed;
        let src = if p.blur_sigma > 0.0 {
            smoothed = imageproc::filter::gaussian_blur_f32(img, p.blur_sigma);
            &smoothed
        } else {
            img
        };
        let edges = imageproc::edges::canny(src, p.canny_low, p.canny_high);
        if p.dilate_radius > 0 {
            imageproc::morphology::dilate(&edges, Norm::LInf, p.dilate_radius)
        } else {
            edges
        }
    }

    fn quad_candidate(&self, contour: &[Point<i32>]) -> Option<Candidate> {
        if contour.len() < 4 {
            return None;
        }
        let contour_area = polygon_area(contour.iter().map(|p| (p.x as f64, p.y as f64)));
        if contour_area <= 0.0 {
            return None;
        }

        let perimeter = arc_length(contour, true);
        let tol = self.params.collinear_tolerance_deg.to_radians();
        let mut vertices = None;
        for &eps_rel in &self.params.approx_epsilons {
            if eps_rel <= 0.0 {
                continue;
            }
            let poly = approximate_polygon_dp(contour, eps_rel * perimeter, true);
            let poly = drop_collinear(
                poly.iter()
                    .map(|p| Point2::new(p.x as f32, p.y as f32))
                    .collect(),
                tol,
            );
            match poly.len() {
                4 => {
                    vertices = Some([poly[0], poly[1], poly[2], poly[3]]);
                    break;
                }
                n if n < 4 => break,
                _ => {}
            }
        }

        let quad = BoardQuad::from_unordered(vertices?).ok()?;
        if quad.side_ratio() < self.params.min_side_ratio {
            return None;
        }

        let area = quad.area();
        let fill_ratio = (area as f64 / contour_area) as f32;
        let min_fill = self.params.min_fill_ratio;
        if fill_ratio < min_fill || fill_ratio * min_fill > 1.0 {
            return None;
        }

        Some(Candidate {
            quad,
            area,
            fill_ratio,
        })
    }
}

/// Downscale so the longest side is at most `max_side`; returns the factor
/// mapping working pixels back to input pixels.
fn downscale(img: &GrayImage, max_side: u32) -> (GrayImage, f32) {
    let longest = img.width().max(img.height());
    if max_side == 0 || longest <= max_side {
        return (img.clone(), 1.0);
    }
    let s = max_side as f32 / longest as f32;
    let w = ((img.width() as f32 * s).round() as u32).max(1);
    let h = ((img.height() as f32 * s).round() as u32).max(1);
    let resized = imageops::resize(img, w, h, FilterType::Triangle);
    (resized, img.width() as f32 / w as f32)
}

/// Off-center sample positions inside a cell; pieces usually cover the center.
const CELL_SAMPLES: [(f32, f32); 8] = [
    (0.2, 0.2),
    (0.5, 0.2),
    (0.8, 0.2),
    (0.2, 0.5),
    (0.8, 0.5),
    (0.2, 0.8),
    (0.5, 0.8),
    (0.8, 0.8),
];

/// Fraction of the 64 cells inside `quad` whose median brightness falls on
/// the side of the light/dark threshold their parity predicts.
///
/// `None` when the two parities are not separated by `min_contrast`.
fn checker_agreement(img: &GrayImage, quad: &BoardQuad, min_contrast: f32) -> Option<f32> {
    let n = BOARD_DIM as f32;
    let cells = [
        Point2::new(0.0, 0.0),
        Point2::new(n, 0.0),
        Point2::new(n, n),
        Point2::new(0.0, n),
    ];
    let h = homography_from_4pt(&cells, &quad.to_array())?;
    let view = ImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        channels: 1,
        data: img.as_raw(),
    };

    let mut medians = [0.0f32; NUM_SQUARES];
    for (i, median) in medians.iter_mut().enumerate() {
        let (row, col) = ((i / BOARD_DIM) as f32, (i % BOARD_DIM) as f32);
        let mut samples = CELL_SAMPLES.map(|(fx, fy)| {
            let p = h.apply(Point2::new(col + fx, row + fy));
            sample_bilinear(&view, p.x, p.y, 0)
        });
        samples.sort_by(f32::total_cmp);
        *median = samples[samples.len() / 2];
    }

    let is_even = |i: usize| (i / BOARD_DIM + i % BOARD_DIM) % 2 == 0;
    let (mut even_sum, mut odd_sum) = (0.0f32, 0.0f32);
    for (i, m) in medians.iter().enumerate() {
        if is_even(i) {
            even_sum += m;
        } else {
            odd_sum += m;
        }
    }
    let half = (NUM_SQUARES / 2) as f32;
    let (even, odd) = (even_sum / half, odd_sum / half);
    if (even - odd).abs() < min_contrast {
        return None;
    }

    let threshold = 0.5 * (even + odd);
    let even_bright = even > odd;
    let agree = medians
        .iter()
        .enumerate()
        .filter(|&(i, &m)| (m > threshold) == (is_even(i) == even_bright))
        .count();
    Some(agree as f32 / NUM_SQUARES as f32)
}

fn rescale_quad(quad: &BoardQuad, scale: f32) -> BoardQuad {
    if scale == 1.0 {
        return *quad;
    }
    // pixel centers: p_in + 0.5 = (p_work + 0.5) * scale
    let f = |p: Point2<f32>| Point2::new((p.x + 0.5) * scale - 0.5, (p.y + 0.5) * scale - 0.5);
    BoardQuad {
        top_left: f(quad.top_left),
        top_right: f(quad.top_right),
        bottom_right: f(quad.bottom_right),
        bottom_left: f(quad.bottom_left),
    }
}

fn polygon_area(points: impl Iterator<Item = (f64, f64)>) -> f64 {
    let pts: Vec<(f64, f64)> = points.collect();
    let n = pts.len();
    let mut acc = 0.0;
    for i in 0..n {
        let (x0, y0) = pts[i];
        let (x1, y1) = pts[(i + 1) % n];
        acc += x0 * y1 - x1 * y0;
    }
    0.5 * acc.abs()
}

/// Remove duplicate vertices and vertices whose turning angle is below `tol`
/// (radians) from a closed polygon.
fn drop_collinear(mut poly: Vec<Point2<f32>>, tol: f32) -> Vec<Point2<f32>> {
    loop {
        let n = poly.len();
        if n < 3 {
            return poly;
        }
        let mut removed = false;
        for i in 0..n {
            let prev = poly[(i + n - 1) % n];
            let cur = poly[i];
            let next = poly[(i + 1) % n];
            let a = cur - prev;
            let b = next - cur;
            let (na, nb) = (a.norm(), b.norm());
            let turn = if na < 1e-3 || nb < 1e-3 {
                0.0
            } else {
                (a.x * b.y - a.y * b.x).atan2(a.dot(&b)).abs()
            };
            if turn < tol {
                poly.remove(i);
                removed = true;
                break;
            }
        }
        if !removed {
            return poly;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collinear_vertices_are_dropped() {
        let poly = vec![
            Point2::new(0.0, 0.0),
            Point2::new(50.0, 1.0),
            Point2::new(100.0, 0.0),
            Point2::new(100.0, 100.0),
            Point2::new(100.0, 100.0),
            Point2::new(0.0, 100.0),
        ];
        let out = drop_collinear(poly, 10f32.to_radians());
        assert_eq!(out.len(), 4);
        assert!(!out.contains(&Point2::new(50.0, 1.0)));
    }

    /// 8x8 board of 20 px squares with its top-left corner at (20, 20).
    fn axis_aligned_board() -> GrayImage {
        GrayImage::from_fn(200, 200, |x, y| {
            if !(20..180).contains(&x) || !(20..180).contains(&y) {
                return image::Luma([120]);
            }
            let (col, row) = ((x - 20) / 20, (y - 20) / 20);
            image::Luma([if (row + col) % 2 == 0 { 225 } else { 40 }])
        })
    }

    fn quad(x0: f32, y0: f32, x1: f32, y1: f32) -> BoardQuad {
        BoardQuad::from_ordered([
            Point2::new(x0, y0),
            Point2::new(x1, y0),
            Point2::new(x1, y1),
            Point2::new(x0, y1),
        ])
        .unwrap()
    }

    #[test]
    fn checkerboard_quad_agrees_everywhere() {
        let img = axis_aligned_board();
        let agreement = checker_agreement(&img, &quad(20.0, 20.0, 180.0, 180.0), 25.0).unwrap();
        assert_eq!(agreement, 1.0);
    }

    #[test]
    fn misaligned_quad_is_not_a_checkerboard() {
        let img = axis_aligned_board();
        // Half a square off on every side: each cell straddles two squares.
        let shifted = checker_agreement(&img, &quad(30.0, 30.0, 190.0, 190.0), 25.0);
        assert!(shifted.map_or(true, |a| a < 0.75), "{shifted:?}");
        // One square too small: the grid drifts by 1/8 square per cell.
        let shrunk = checker_agreement(&img, &quad(20.0, 20.0, 160.0, 180.0), 25.0);
        assert!(shrunk.map_or(true, |a| a < 0.75), "{shrunk:?}");
        // Background only.
        let blank = GrayImage::from_pixel(50, 50, image::Luma([90]));
        assert_eq!(checker_agreement(&blank, &quad(5.0, 5.0, 45.0, 45.0), 25.0), None);
    }

    #[test]
    fn polygon_area_of_square() {
        let sq = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)];
        assert_eq!(polygon_area(sq.into_iter()), 100.0);
    }

    #[test]
    fn downscale_keeps_small_images() {
        let img = GrayImage::new(300, 200);
        let (work, scale) = downscale(&img, 1024);
        assert_eq!(work.dimensions(), (300, 200));
        assert_eq!(scale, 1.0);

        let (work, scale) = downscale(&img, 150);
        assert_eq!(work.dimensions(), (150, 100));
        assert_eq!(scale, 2.0);
    }

    #[test]
    fn empty_image_is_rejected() {
        let det = BoardDetector::new(BoardDetectorParams::default());
        let err = det.detect(&GrayImage::new(0, 10)).unwrap_err();
        assert!(matches!(err, DetectError::EmptyImage { .. }));
    }

    #[test]
    fn uniform_image_has_no_board() {
        let det = BoardDetector::new(BoardDetectorParams::default());
        let img = GrayImage::from_pixel(320, 240, image::Luma([128]));
        assert_eq!(det.detect(&img).unwrap_err(), DetectError::NoContours);
    }
}
