//! The four outer corners of a board as seen in a photograph.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Fraction of the quad area below which three consecutive corners are
/// treated as collinear.
const MIN_CORNER_TRIANGLE_FRAC: f32 = 0.02;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum QuadError {
    #[error("corner coordinates must be finite")]
    NonFinite,
    #[error("corners are degenerate (area={area:.2} px^2)")]
    Degenerate { area: f32 },
    #[error("corners do not form a convex quadrilateral")]
    NotConvex,
}

/// Outer board corners in source-image pixels, clockwise from top-left.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardQuad {
    pub top_left: Point2<f32>,
    pub top_right: Point2<f32>,
    pub bottom_right: Point2<f32>,
    pub bottom_left: Point2<f32>,
}

#[inline]
fn cross(a: Vector2<f32>, b: Vector2<f32>) -> f32 {
    a.x * b.y - a.y * b.x
}

impl BoardQuad {
    /// Build from corners already ordered `[tl, tr, br, bl]` and validate them.
    pub fn from_ordered(pts: [Point2<f32>; 4]) -> Result<Self, QuadError> {
        let quad = Self {
            top_left: pts[0],
            top_right: pts[1],
            bottom_right: pts[2],
            bottom_left: pts[3],
        };
        quad.validate()?;
        Ok(quad)
    }

    /// Order four arbitrary corners clockwise (in y-down image coordinates)
    /// starting from the one closest to the image origin, then validate.
    pub fn from_unordered(pts: [Point2<f32>; 4]) -> Result<Self, QuadError> {
        if pts.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(QuadError::NonFinite);
        }
        let cx = pts.iter().map(|p| p.x).sum::<f32>() / 4.0;
        let cy = pts.iter().map(|p| p.y).sum::<f32>() / 4.0;

        let mut sorted = pts;
        // atan2 grows clockwise on screen because y points down.
        sorted.sort_by(|a, b| {
            let ta = (a.y - cy).atan2(a.x - cx);
            let tb = (b.y - cy).atan2(b.x - cx);
            ta.total_cmp(&tb)
        });

        let start = (0..4)
            .min_by(|&i, &j| {
                let si = sorted[i].x + sorted[i].y;
                let sj = sorted[j].x + sorted[j].y;
                si.total_cmp(&sj)
            })
            .unwrap_or(0);
        sorted.rotate_left(start);

        Self::from_ordered(sorted)
    }

    pub fn to_array(&self) -> [Point2<f32>; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Signed shoelace area; positive for clockwise-on-screen order.
    pub fn signed_area(&self) -> f32 {
        let p = self.to_array();
        let mut acc = 0.0_f32;
        for i in 0..4 {
            let a = p[i];
            let b = p[(i + 1) % 4];
            acc += a.x * b.y - b.x * a.y;
        }
        0.5 * acc
    }

    pub fn area(&self) -> f32 {
        self.signed_area().abs()
    }

    /// True when every turn has the same (clockwise) sense.
    pub fn is_convex(&self) -> bool {
        let p = self.to_array();
        (0..4).all(|i| {
            let e0 = p[(i + 1) % 4] - p[i];
            let e1 = p[(i + 2) % 4] - p[(i + 1) % 4];
            cross(e0, e1) > 0.0
        })
    }

    /// Check finiteness, convexity and that no three consecutive corners are
    /// (nearly) collinear.
    pub fn validate(&self) -> Result<(), QuadError> {
        let p = self.to_array();
        if p.iter().any(|q| !q.x.is_finite() || !q.y.is_finite()) {
            return Err(QuadError::NonFinite);
        }
        let area = self.area();
        if area < 1.0 {
            return Err(QuadError::Degenerate { area });
        }
        for i in 0..4 {
            let e0 = p[(i + 1) % 4] - p[i];
            let e1 = p[(i + 2) % 4] - p[i];
            let tri = 0.5 * cross(e0, e1).abs();
            if tri < MIN_CORNER_TRIANGLE_FRAC * area {
                return Err(QuadError::Degenerate { area });
            }
        }
        if !self.is_convex() {
            return Err(QuadError::NotConvex);
        }
        Ok(())
    }

    /// Ratio of the shortest to the longest side, in `(0, 1]`.
    pub fn side_ratio(&self) -> f32 {
        let p = self.to_array();
        let sides = (0..4).map(|i| (p[(i + 1) % 4] - p[i]).norm());
        let (min, max) = sides.fold((f32::INFINITY, 0.0_f32), |(lo, hi), s| {
            (lo.min(s), hi.max(s))
        });
        if max <= 0.0 {
            0.0
        } else {
            min / max
        }
    }

    /// Uniformly scale all corners (e.g. to undo a detection downscale).
    pub fn scaled(&self, s: f32) -> Self {
        let f = |p: Point2<f32>| Point2::new(p.x * s, p.y * s);
        Self {
            top_left: f(self.top_left),
            top_right: f(self.top_right),
            bottom_right: f(self.bottom_right),
            bottom_left: f(self.bottom_left),
        }
    }

    /// Rotate the corner labels by a quarter turn clockwise: the old
    /// bottom-left becomes the new top-left.
    pub fn rotated_cw(&self) -> Self {
        Self {
            top_left: self.bottom_left,
            top_right: self.top_left,
            bottom_right: self.top_right,
            bottom_left: self.bottom_right,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point2<f32> {
        Point2::new(x, y)
    }

    #[test]
    fn unordered_corners_are_sorted_clockwise_from_top_left() {
        let quad = BoardQuad::from_unordered([
            p(410.0, 395.0),
            p(20.0, 30.0),
            p(35.0, 420.0),
            p(400.0, 15.0),
        ])
        .expect("valid quad");
        assert_eq!(quad.top_left, p(20.0, 30.0));
        assert_eq!(quad.top_right, p(400.0, 15.0));
        assert_eq!(quad.bottom_right, p(410.0, 395.0));
        assert_eq!(quad.bottom_left, p(35.0, 420.0));
        assert!(quad.is_convex());
        assert!(quad.signed_area() > 0.0);
    }

    #[test]
    fn rotated_board_keeps_consistent_order() {
        // Diamond: the top vertex has the smallest x + y only together with the left one.
        let quad = BoardQuad::from_unordered([
            p(200.0, 10.0),
            p(390.0, 200.0),
            p(200.0, 390.0),
            p(10.0, 200.0),
        ])
        .expect("valid quad");
        assert!(quad.is_convex());
        let order = quad.to_array();
        for i in 0..4 {
            let a = order[i];
            let b = order[(i + 1) % 4];
            let c = order[(i + 2) % 4];
            assert!(cross(b - a, c - b) > 0.0);
        }
    }

    #[test]
    fn collinear_corners_are_degenerate() {
        let err = BoardQuad::from_ordered([
            p(0.0, 0.0),
            p(50.0, 0.0),
            p(100.0, 0.0),
            p(0.0, 100.0),
        ])
        .unwrap_err();
        assert!(matches!(err, QuadError::Degenerate { .. }));
    }

    #[test]
    fn self_intersecting_order_is_rejected() {
        let err = BoardQuad::from_ordered([
            p(0.0, 0.0),
            p(100.0, 100.0),
            p(100.0, 0.0),
            p(0.0, 100.0),
        ])
        .unwrap_err();
        assert_ne!(err, QuadError::NonFinite);
    }

    #[test]
    fn non_finite_corners_are_rejected() {
        let err = BoardQuad::from_unordered([
            p(f32::NAN, 0.0),
            p(1.0, 0.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
        ])
        .unwrap_err();
        assert_eq!(err, QuadError::NonFinite);
    }

    #[test]
    fn side_ratio_and_scale() {
        let quad =
            BoardQuad::from_ordered([p(0.0, 0.0), p(200.0, 0.0), p(200.0, 100.0), p(0.0, 100.0)])
                .unwrap();
        assert!((quad.side_ratio() - 0.5).abs() < 1e-6);
        let doubled = quad.scaled(2.0);
        assert_eq!(doubled.bottom_right, p(400.0, 200.0));
        assert!((doubled.area() - 4.0 * quad.area()).abs() < 1e-3);
        assert_eq!(quad.rotated_cw().top_left, p(0.0, 100.0));
    }
}
