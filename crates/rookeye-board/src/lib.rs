//! Chessboard outline detection and rectification.
//!
//! ## Quickstart
//!
//! ```no_run
//! use rookeye_board::{rectify_board, BoardDetector, BoardDetectorParams, RectifyParams};
//! use rookeye_core::{ImageView, Orientation};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = image::open("board.jpg")?.to_rgb8();
//! let gray = image::DynamicImage::ImageRgb8(photo.clone()).to_luma8();
//!
//! let detection = BoardDetector::new(BoardDetectorParams::default()).detect(&gray)?;
//! let view = ImageView::new(
//!     photo.width() as usize,
//!     photo.height() as usize,
//!     3,
//!     photo.as_raw(),
//! )
//! .expect("rgb buffer");
//! let board = rectify_board(&view, &detection.corners, &RectifyParams::default())?;
//! let squares = board.squares(Orientation::WhiteBottom);
//! println!("first square: {:?}", squares.as_slice()[0]);
//! # Ok(())
//! # }
//! ```

mod detector;
mod params;
mod rectify;

pub use detector::{BoardDetection, BoardDetector, DetectError};
pub use params::{BoardDetectorParams, RectifyParams};
pub use rectify::{rectify_board, RectifiedBoard, RectifyError};
