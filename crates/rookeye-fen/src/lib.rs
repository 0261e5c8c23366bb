//! Piece assignment and FEN serialization.
//!
//! ```
//! use rookeye_core::{BoardSquares, Orientation};
//! use rookeye_fen::{assign_detections, AssignParams, Detection, Fen, SideToMove};
//!
//! let squares = BoardSquares::partition(800, 800, Orientation::WhiteBottom);
//! // White king (class 8) on e1, black king (class 2) on e8.
//! let detections = [
//!     Detection::new(450.0, 750.0, 8, Some(0.93)),
//!     Detection::new(450.0, 50.0, 2, Some(0.91)),
//! ];
//! let assignment = assign_detections(&squares, &detections, &AssignParams::default()).unwrap();
//! let fen = Fen::from_placement(&assignment.placement, SideToMove::White);
//! assert_eq!(fen.to_string(), "4k3/8/8/8/8/8/8/4K3 w - - 0 1");
//! ```

mod assign;
mod fen;
mod piece;
mod placement;

pub use assign::{
    assign_detections, AssignError, AssignParams, Assignment, AssignWarning, Detection,
    Resolution, SquareClaim,
};
pub use fen::{
    decode_placement, encode_placement, Fen, FenError, FenParams, SideToMove,
    DEFAULT_ANALYSIS_BASE_URL,
};
pub use piece::{ClassTableError, Color, InvalidPieceSymbol, Piece, PieceClassTable, PieceKind};
pub use placement::PlacementMap;
