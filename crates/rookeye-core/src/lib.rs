//! Core types and utilities for chessboard digitization.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any image codec, edge detector or piece classifier.
//!
//! ## Conventions
//! - Image coordinates are pixel indices: `x` grows to the right, `y` grows down.
//! - A [`BoardQuad`] lists the outer board corners clockwise starting at the
//!   top-left corner as seen in the photograph.
//! - A rectified canvas is split into 8x8 cells; each cell is labelled with a
//!   board-relative [`SquareIndex`] (`1 = a8`, `8 = h8`, `57 = a1`, `64 = h1`).
//!   Which canvas cell receives which index is decided by [`Orientation`].

mod homography;
mod image;
mod logger;
mod quad;
mod squares;

pub use homography::{homography_from_4pt, warp_perspective, Homography};
pub use image::{sample_bilinear, sample_bilinear_u8, Image, ImageView};
pub use quad::{BoardQuad, QuadError};
pub use squares::{
    BoardSquares, InvalidBoardSquares, InvalidSquareIndex, Orientation, Square, SquareIndex,
    BOARD_DIM, NUM_SQUARES,
};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
