use rookeye_core::SquareIndex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{FenError, Piece};

/// Sparse square -> piece map; empty squares are absent.
///
/// Iteration is always in ascending square index, independent of insertion
/// order. Serialized as `{ "1": "r", "64": "R" }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementMap {
    squares: BTreeMap<SquareIndex, Piece>,
}

impl PlacementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw `(index, symbol)` pairs, checking both.
    pub fn from_raw(entries: impl IntoIterator<Item = (u32, char)>) -> Result<Self, FenError> {
        let mut map = Self::new();
        for (index, symbol) in entries {
            let index = SquareIndex::new(index)?;
            let piece = Piece::try_from(symbol)?;
            map.insert(index, piece);
        }
        Ok(map)
    }

    /// Place a piece, returning the one it replaced.
    pub fn insert(&mut self, index: SquareIndex, piece: Piece) -> Option<Piece> {
        self.squares.insert(index, piece)
    }

    pub fn remove(&mut self, index: SquareIndex) -> Option<Piece> {
        self.squares.remove(&index)
    }

    pub fn get(&self, index: SquareIndex) -> Option<Piece> {
        self.squares.get(&index).copied()
    }

    pub fn len(&self) -> usize {
        self.squares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SquareIndex, Piece)> + '_ {
        self.squares.iter().map(|(&i, &p)| (i, p))
    }
}

impl FromIterator<(SquareIndex, Piece)> for PlacementMap {
    fn from_iter<T: IntoIterator<Item = (SquareIndex, Piece)>>(iter: T) -> Self {
        Self {
            squares: iter.into_iter().collect(),
        }
    }
}
