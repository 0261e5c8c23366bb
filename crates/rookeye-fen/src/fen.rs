//! FEN board-placement encoding and the analysis-board link.

use rookeye_core::{InvalidSquareIndex, SquareIndex, BOARD_DIM, NUM_SQUARES};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{InvalidPieceSymbol, Piece, PlacementMap};

pub const DEFAULT_ANALYSIS_BASE_URL: &str = "https://lichess.org/analysis/standard/";

/// Castling, en-passant and clocks cannot be observed from a photograph.
const FIXED_FIELDS: &str = "- - 0 1";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("malformed placement map: {0}")]
    MalformedPlacementMap(#[from] InvalidSquareIndex),
    #[error(transparent)]
    InvalidPieceSymbol(#[from] InvalidPieceSymbol),
    #[error("placement has {0} ranks (expected 8)")]
    RankCount(usize),
    #[error("rank {rank} covers {squares} squares (expected 8)")]
    RankLength { rank: usize, squares: usize },
    #[error("invalid side to move {0:?}")]
    InvalidSideToMove(String),
    #[error("empty FEN")]
    Empty,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideToMove {
    #[default]
    White,
    Black,
}

impl SideToMove {
    pub fn marker(self) -> char {
        match self {
            SideToMove::White => 'w',
            SideToMove::Black => 'b',
        }
    }
}

/// FEN output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FenParams {
    /// Prefix of the analysis link; the placement and side marker are appended.
    pub analysis_base_url: String,
}

impl Default for FenParams {
    fn default() -> Self {
        Self {
            analysis_base_url: DEFAULT_ANALYSIS_BASE_URL.to_string(),
        }
    }
}

/// Encode the board-placement field, walking indices 1..=64 in order.
pub fn encode_placement(map: &PlacementMap) -> String {
    let mut out = String::with_capacity(72);
    let mut empty = 0u8;
    for index in SquareIndex::all() {
        match map.get(index) {
            Some(piece) => {
                if empty > 0 {
                    out.push((b'0' + empty) as char);
                }
                out.push(piece.symbol());
                empty = 0;
            }
            None => empty += 1,
        }
        if index.get() as usize % BOARD_DIM == 0 {
            if empty > 0 {
                out.push((b'0' + empty) as char);
            }
            empty = 0;
            if (index.get() as usize) < NUM_SQUARES {
                out.push('/');
            }
        }
    }
    out
}

/// Parse a board-placement field (digits = empty runs, letters = pieces).
pub fn decode_placement(placement: &str) -> Result<PlacementMap, FenError> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != BOARD_DIM {
        return Err(FenError::RankCount(ranks.len()));
    }

    let mut map = PlacementMap::new();
    for (rank_row, rank) in ranks.iter().enumerate() {
        let mut file = 0usize;
        for c in rank.chars() {
            if let Some(run) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                file += run as usize;
                continue;
            }
            let piece = Piece::try_from(c)?;
            if let Some(index) = SquareIndex::from_rank_file(rank_row, file) {
                map.insert(index, piece);
            }
            file += 1;
        }
        if file != BOARD_DIM {
            return Err(FenError::RankLength {
                rank: BOARD_DIM - rank_row,
                squares: file,
            });
        }
    }
    Ok(map)
}

/// Board placement plus side to move; the remaining fields are fixed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fen {
    pub placement: String,
    pub side_to_move: SideToMove,
}

impl Fen {
    pub fn from_placement(map: &PlacementMap, side_to_move: SideToMove) -> Self {
        Self {
            placement: encode_placement(map),
            side_to_move,
        }
    }

    /// Parse `placement [w|b] ...`; fields after the side marker are ignored.
    pub fn parse(text: &str) -> Result<Self, FenError> {
        let mut fields = text.split_whitespace();
        let placement = fields.next().ok_or(FenError::Empty)?;
        decode_placement(placement)?;
        let side_to_move = match fields.next() {
            None | Some("w") => SideToMove::White,
            Some("b") => SideToMove::Black,
            Some(other) => return Err(FenError::InvalidSideToMove(other.to_string())),
        };
        Ok(Self {
            placement: placement.to_string(),
            side_to_move,
        })
    }

    pub fn placement_map(&self) -> Result<PlacementMap, FenError> {
        decode_placement(&self.placement)
    }

    /// `<base>/<placement>%20<w|b>`.
    pub fn analysis_link(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        format!(
            "{}/{}%20{}",
            base,
            encode_path(&self.placement),
            self.side_to_move.marker()
        )
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.placement,
            self.side_to_move.marker(),
            FIXED_FIELDS
        )
    }
}

/// Percent-encode everything but unreserved characters and `/`.
fn encode_path(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~' | b'/') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_board() {
        let fen = Fen::from_placement(&PlacementMap::new(), SideToMove::White);
        assert_eq!(fen.to_string(), "8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn trailing_runs_are_flushed_per_rank() {
        let map = PlacementMap::from_raw([(8, 'k'), (9, 'p'), (64, 'K')]).unwrap();
        assert_eq!(encode_placement(&map), "7k/p7/8/8/8/8/8/7K");
    }

    #[test]
    fn black_to_move_marker() {
        let map = PlacementMap::from_raw([(1, 'r')]).unwrap();
        let fen = Fen::from_placement(&map, SideToMove::Black);
        assert_eq!(fen.to_string(), "r7/8/8/8/8/8/8/8 b - - 0 1");
        assert_eq!(
            fen.analysis_link(DEFAULT_ANALYSIS_BASE_URL),
            "https://lichess.org/analysis/standard/r7/8/8/8/8/8/8/8%20b"
        );
    }

    #[test]
    fn link_base_without_trailing_slash() {
        let fen = Fen::from_placement(&PlacementMap::new(), SideToMove::White);
        assert_eq!(
            fen.analysis_link("https://example.org/analysis/standard"),
            "https://example.org/analysis/standard/8/8/8/8/8/8/8/8%20w"
        );
    }

    #[test]
    fn decode_rejects_malformed_placements() {
        assert_eq!(
            decode_placement("8/8/8/8/8/8/8").unwrap_err(),
            FenError::RankCount(7)
        );
        assert_eq!(
            decode_placement("8/8/8/8/8/8/8/7").unwrap_err(),
            FenError::RankLength {
                rank: 1,
                squares: 7
            }
        );
        assert_eq!(
            decode_placement("9/8/8/8/8/8/8/8").unwrap_err(),
            FenError::InvalidPieceSymbol(InvalidPieceSymbol('9'))
        );
        assert!(decode_placement("ppppppppp/8/8/8/8/8/8/8").is_err());
    }

    #[test]
    fn parse_reads_side_marker() {
        let fen = Fen::parse("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
        assert_eq!(fen.side_to_move, SideToMove::Black);
        assert_eq!(fen.placement_map().unwrap().len(), 2);
        assert!(matches!(
            Fen::parse("8/8/8/8/8/8/8/8 x").unwrap_err(),
            FenError::InvalidSideToMove(_)
        ));
        assert_eq!(Fen::parse("   ").unwrap_err(), FenError::Empty);
    }
}
