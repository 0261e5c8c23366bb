//! Partition of a rectified canvas into the 64 board squares.
//!
//! Square indices are board-relative and row-major from a8: `1 = a8`,
//! `8 = h8`, `57 = a1`, `64 = h1`. [`Orientation`] decides which canvas
//! cell carries which index.
//!
//! Boundary rule: every square owns its top and left edges. The right edge
//! of the last canvas column and the bottom edge of the last canvas row are
//! owned by the squares along them, so the closed canvas is covered exactly
//! once. A point on an edge shared by two squares therefore belongs to the
//! square to its right (or below) in the canvas.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of squares along one board side.
pub const BOARD_DIM: usize = 8;
pub const NUM_SQUARES: usize = BOARD_DIM * BOARD_DIM;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("square index {0} is outside 1..=64")]
pub struct InvalidSquareIndex(pub u32);

/// Board-relative square index in `1..=64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct SquareIndex(u8);

impl SquareIndex {
    pub const MIN: SquareIndex = SquareIndex(1);
    pub const MAX: SquareIndex = SquareIndex(NUM_SQUARES as u8);

    pub fn new(index: u32) -> Result<Self, InvalidSquareIndex> {
        if (1..=NUM_SQUARES as u32).contains(&index) {
            Ok(Self(index as u8))
        } else {
            Err(InvalidSquareIndex(index))
        }
    }

    /// Index of the square on board `rank_row` (0 = rank 8) and `file_col` (0 = file a).
    pub fn from_rank_file(rank_row: usize, file_col: usize) -> Option<Self> {
        (rank_row < BOARD_DIM && file_col < BOARD_DIM)
            .then(|| Self((rank_row * BOARD_DIM + file_col + 1) as u8))
    }

    pub fn get(self) -> u32 {
        self.0 as u32
    }

    /// 0 for rank 8 down to 7 for rank 1.
    pub fn rank_row(self) -> usize {
        (self.0 as usize - 1) / BOARD_DIM
    }

    /// 0 for file a up to 7 for file h.
    pub fn file_col(self) -> usize {
        (self.0 as usize - 1) % BOARD_DIM
    }

    /// Algebraic name, e.g. `a8` for index 1.
    pub fn algebraic(self) -> String {
        let file = (b'a' + self.file_col() as u8) as char;
        let rank = BOARD_DIM - self.rank_row();
        format!("{file}{rank}")
    }

    /// All 64 indices in ascending order.
    pub fn all() -> impl Iterator<Item = SquareIndex> {
        (1..=NUM_SQUARES as u8).map(SquareIndex)
    }
}

impl TryFrom<u32> for SquareIndex {
    type Error = InvalidSquareIndex;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SquareIndex> for u32 {
    fn from(value: SquareIndex) -> Self {
        value.get()
    }
}

impl fmt::Display for SquareIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.0, self.algebraic())
    }
}

/// Which side of the board sits at the bottom of the rectified canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Canvas top-left is a8, canvas bottom-right is h1.
    #[default]
    WhiteBottom,
    /// Canvas top-left is h1, canvas bottom-right is a8.
    BlackBottom,
}

impl Orientation {
    /// Board index of the canvas cell at (`row`, `col`), both in `0..8`.
    pub fn index_of_cell(self, row: usize, col: usize) -> Option<SquareIndex> {
        if row >= BOARD_DIM || col >= BOARD_DIM {
            return None;
        }
        match self {
            Orientation::WhiteBottom => SquareIndex::from_rank_file(row, col),
            Orientation::BlackBottom => {
                SquareIndex::from_rank_file(BOARD_DIM - 1 - row, BOARD_DIM - 1 - col)
            }
        }
    }

    /// Canvas cell `(row, col)` holding the given board square.
    pub fn cell_of_index(self, index: SquareIndex) -> (usize, usize) {
        let (r, c) = (index.rank_row(), index.file_col());
        match self {
            Orientation::WhiteBottom => (r, c),
            Orientation::BlackBottom => (BOARD_DIM - 1 - r, BOARD_DIM - 1 - c),
        }
    }
}

/// One labelled, axis-aligned square of the rectified canvas.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Square {
    pub index: SquareIndex,
    /// Canvas cell row (0 = top of the canvas).
    pub row: usize,
    /// Canvas cell column (0 = left of the canvas).
    pub col: usize,
    pub min: Point2<f32>,
    pub max: Point2<f32>,
}

impl Square {
    pub fn top_left(&self) -> Point2<f32> {
        self.min
    }

    pub fn top_right(&self) -> Point2<f32> {
        Point2::new(self.max.x, self.min.y)
    }

    pub fn bottom_right(&self) -> Point2<f32> {
        self.max
    }

    pub fn bottom_left(&self) -> Point2<f32> {
        Point2::new(self.min.x, self.max.y)
    }

    /// `[tl, tr, br, bl]` in rectified pixels.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        [
            self.top_left(),
            self.top_right(),
            self.bottom_right(),
            self.bottom_left(),
        ]
    }

    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            0.5 * (self.min.x + self.max.x),
            0.5 * (self.min.y + self.max.y),
        )
    }

    /// Containment under the top/left-inclusive rule described in the module docs.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        let last = BOARD_DIM - 1;
        let in_x = p.x >= self.min.x && (p.x < self.max.x || (self.col == last && p.x <= self.max.x));
        let in_y = p.y >= self.min.y && (p.y < self.max.y || (self.row == last && p.y <= self.max.y));
        in_x && in_y
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InvalidBoardSquares {
    #[error("canvas size {width}x{height} is not positive and finite")]
    CanvasSize { width: f32, height: f32 },
    #[error("expected 64 squares, got {0}")]
    Count(usize),
    #[error("square at position {position} has index {index}")]
    OutOfOrder { position: usize, index: SquareIndex },
    #[error("square {index} sits in cell ({row}, {col}), which the orientation does not give it")]
    WrongCell {
        index: SquareIndex,
        row: usize,
        col: usize,
    },
}

/// The 64 squares of a rectified canvas, stored in ascending index order.
///
/// Deserialization checks that ordering, so [`BoardSquares::get`] can index directly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBoardSquares")]
pub struct BoardSquares {
    pub width: f32,
    pub height: f32,
    pub orientation: Orientation,
    squares: Vec<Square>,
}

#[derive(Deserialize)]
struct RawBoardSquares {
    width: f32,
    height: f32,
    orientation: Orientation,
    squares: Vec<Square>,
}

impl TryFrom<RawBoardSquares> for BoardSquares {
    type Error = InvalidBoardSquares;

    fn try_from(raw: RawBoardSquares) -> Result<Self, Self::Error> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(raw.width) || !positive(raw.height) {
            return Err(InvalidBoardSquares::CanvasSize {
                width: raw.width,
                height: raw.height,
            });
        }
        if raw.squares.len() != NUM_SQUARES {
            return Err(InvalidBoardSquares::Count(raw.squares.len()));
        }
        for (position, (sq, expected)) in raw.squares.iter().zip(SquareIndex::all()).enumerate() {
            if sq.index != expected {
                return Err(InvalidBoardSquares::OutOfOrder {
                    position,
                    index: sq.index,
                });
            }
            if raw.orientation.cell_of_index(sq.index) != (sq.row, sq.col) {
                return Err(InvalidBoardSquares::WrongCell {
                    index: sq.index,
                    row: sq.row,
                    col: sq.col,
                });
            }
        }
        Ok(Self {
            width: raw.width,
            height: raw.height,
            orientation: raw.orientation,
            squares: raw.squares,
        })
    }
}

impl BoardSquares {
    /// Split a `width` x `height` canvas into 8 equal bands per axis.
    ///
    /// A pure function of its inputs: equal arguments give bit-identical squares.
    pub fn partition(width: u32, height: u32, orientation: Orientation) -> Self {
        let w = width as f32;
        let h = height as f32;
        let n = BOARD_DIM as f32;
        // Shared edges come from the same expression, so neighbours agree exactly.
        let x_at = |k: usize| k as f32 * w / n;
        let y_at = |k: usize| k as f32 * h / n;

        let mut squares = Vec::with_capacity(NUM_SQUARES);
        for row in 0..BOARD_DIM {
            for col in 0..BOARD_DIM {
                let Some(index) = orientation.index_of_cell(row, col) else {
                    continue;
                };
                squares.push(Square {
                    index,
                    row,
                    col,
                    min: Point2::new(x_at(col), y_at(row)),
                    max: Point2::new(x_at(col + 1), y_at(row + 1)),
                });
            }
        }
        squares.sort_by_key(|s| s.index);

        Self {
            width: w,
            height: h,
            orientation,
            squares,
        }
    }

    pub fn get(&self, index: SquareIndex) -> &Square {
        &self.squares[index.get() as usize - 1]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Square> {
        self.squares.iter()
    }

    pub fn as_slice(&self) -> &[Square] {
        &self.squares
    }

    /// Square containing `p`, testing every square's bounds in index order.
    pub fn locate(&self, p: Point2<f32>) -> Option<SquareIndex> {
        if !p.x.is_finite() || !p.y.is_finite() {
            return None;
        }
        self.squares.iter().find(|s| s.contains(p)).map(|s| s.index)
    }
}
