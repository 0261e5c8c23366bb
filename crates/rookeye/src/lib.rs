//! Photograph of a chessboard in, FEN position and analysis link out.
//!
//! The pipeline is a pure function of (photo, piece detections, config):
//! locate the board outline, rectify it onto a square canvas, split the
//! canvas into 64 labelled squares, drop each detection onto its square and
//! serialize the result as FEN.
//!
//! ## Quickstart
//!
//! ```no_run
//! use rookeye::{io, DigitizeConfig, Digitizer, StaticDetections};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = image::open("board.jpg")?.to_rgb8();
//! let detections = io::load_predictions("predictions.json")?;
//!
//! let digitizer = Digitizer::new(DigitizeConfig::default());
//! let result = digitizer.digitize(&photo, &StaticDetections::new(detections))?;
//! println!("{}", result.fen);
//! println!("{}", result.link);
//! for warning in result.warnings() {
//!     eprintln!("warning: {warning}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `rookeye::core`: homographies, image views, board quads, square partitioning.
//! - `rookeye::board`: board outline detection and rectification.
//! - `rookeye::fen`: piece assignment and FEN encoding.
//! - `rookeye::io`: JSON predictions, reports and image export.

pub use rookeye_board as board;
pub use rookeye_core as core;
pub use rookeye_fen as fen;

pub use rookeye_core::{BoardQuad, BoardSquares, Orientation, SquareIndex};
pub use rookeye_fen::{AssignWarning, Detection, Fen, PlacementMap, SideToMove};

pub mod io;
mod pipeline;

pub use pipeline::{
    rgb_view, ClassifierError, DigitizeConfig, DigitizeError, Digitization, Digitizer,
    PieceClassifier, StaticDetections,
};
