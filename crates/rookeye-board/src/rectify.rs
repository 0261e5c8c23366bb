use log::debug;
use nalgebra::Point2;
use rookeye_core::{
    homography_from_4pt, warp_perspective, BoardQuad, BoardSquares, Homography, Image, ImageView,
    Orientation, QuadError, Square, BOARD_DIM,
};

use crate::RectifyParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Reasons a board could not be rectified.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RectifyError {
    #[error("rectified canvas size must be at least {min} px (got {size_px})")]
    InvalidSize { size_px: u32, min: u32 },
    #[error("source image is empty")]
    EmptyImage,
    #[error("degenerate board corners: {0}")]
    Degenerate(#[from] QuadError),
    #[error("homography estimation failed")]
    HomographyFailed,
    #[error("homography not invertible")]
    NonInvertible,
}

/// Fronto-parallel view of the board on a square canvas.
#[derive(Clone, Debug)]
pub struct RectifiedBoard {
    pub image: Image,
    pub size_px: u32,
    /// Source-image corners the canvas corners were mapped from.
    pub corners: BoardQuad,
    pub h_img_from_rect: Homography,
    pub h_rect_from_img: Homography,
}

impl RectifiedBoard {
    /// The 64 canvas squares labelled for the given orientation.
    pub fn squares(&self, orientation: Orientation) -> BoardSquares {
        BoardSquares::partition(self.size_px, self.size_px, orientation)
    }

    pub fn to_image(&self, p_rect: Point2<f32>) -> Point2<f32> {
        self.h_img_from_rect.apply(p_rect)
    }

    pub fn to_rect(&self, p_img: Point2<f32>) -> Point2<f32> {
        self.h_rect_from_img.apply(p_img)
    }

    /// The 9x9 grid-line intersections projected into the source image,
    /// row-major from the canvas top-left.
    pub fn lattice_in_image(&self) -> Vec<Point2<f32>> {
        let step = self.size_px as f32 / BOARD_DIM as f32;
        (0..=BOARD_DIM)
            .flat_map(|j| {
                (0..=BOARD_DIM).map(move |i| Point2::new(i as f32 * step, j as f32 * step))
            })
            .map(|p| self.to_image(p))
            .collect()
    }

    /// One square's outline in source-image pixels, `[tl, tr, br, bl]` of the canvas cell.
    pub fn square_in_image(&self, square: &Square) -> [Point2<f32>; 4] {
        square.corners().map(|p| self.to_image(p))
    }
}

/// Map `corners` onto the corners of a `size_px` square canvas and resample `src`.
///
/// The input image is never modified; exactly one new image is produced.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(src, corners, params), fields(size_px = params.size_px))
)]
pub fn rectify_board(
    src: &ImageView<'_>,
    corners: &BoardQuad,
    params: &RectifyParams,
) -> Result<RectifiedBoard, RectifyError> {
    let min = BOARD_DIM as u32;
    if params.size_px < min {
        return Err(RectifyError::InvalidSize {
            size_px: params.size_px,
            min,
        });
    }
    if src.is_empty() {
        return Err(RectifyError::EmptyImage);
    }
    corners.validate()?;

    let n = params.size_px as f32;
    let rect_pts = [
        Point2::new(0.0, 0.0),
        Point2::new(n, 0.0),
        Point2::new(n, n),
        Point2::new(0.0, n),
    ];
    let img_pts = corners.to_array();

    let h_img_from_rect =
        homography_from_4pt(&rect_pts, &img_pts).ok_or(RectifyError::HomographyFailed)?;
    let h_rect_from_img = h_img_from_rect
        .inverse()
        .ok_or(RectifyError::NonInvertible)?;

    let image = warp_perspective(
        src,
        h_img_from_rect,
        params.size_px as usize,
        params.size_px as usize,
    );
    debug!(
        "rectified {}x{} -> {}x{}",
        src.width, src.height, image.width, image.height
    );

    Ok(RectifiedBoard {
        image,
        size_px: params.size_px,
        corners: *corners,
        h_img_from_rect,
        h_rect_from_img,
    })
}
