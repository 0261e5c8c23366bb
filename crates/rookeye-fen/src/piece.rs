use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    fn letter(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid piece symbol {0:?}")]
pub struct InvalidPieceSymbol(pub char);

/// A coloured piece, serialized as its FEN letter (uppercase = white).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "char", into = "char")]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    pub fn symbol(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        let color = if symbol.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let lower = symbol.to_ascii_lowercase();
        PieceKind::ALL
            .into_iter()
            .find(|k| k.letter() == lower)
            .map(|kind| Self { color, kind })
    }

    /// All 12 pieces, white first.
    pub fn all() -> impl Iterator<Item = Piece> {
        [Color::White, Color::Black]
            .into_iter()
            .flat_map(|color| PieceKind::ALL.into_iter().map(move |kind| Piece { color, kind }))
    }
}

impl TryFrom<char> for Piece {
    type Error = InvalidPieceSymbol;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        Piece::from_symbol(value).ok_or(InvalidPieceSymbol(value))
    }
}

impl From<Piece> for char {
    fn from(value: Piece) -> Self {
        value.symbol()
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassTableError {
    #[error("class table must have 12 entries (got {0})")]
    WrongSize(usize),
    #[error("piece {0} is mapped by more than one class id")]
    DuplicatePiece(Piece),
}

/// Classifier class id -> piece.
///
/// Serialized as a JSON object keyed by class id: `{ "1": "b", "2": "k", ... }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u32, Piece>", into = "BTreeMap<u32, Piece>")]
pub struct PieceClassTable {
    entries: BTreeMap<u32, Piece>,
}

impl PieceClassTable {
    /// Build a table mapping 12 class ids onto the 12 distinct pieces.
    pub fn new(entries: impl IntoIterator<Item = (u32, Piece)>) -> Result<Self, ClassTableError> {
        let entries: BTreeMap<u32, Piece> = entries.into_iter().collect();
        if entries.len() != 12 {
            return Err(ClassTableError::WrongSize(entries.len()));
        }
        let mut seen = Vec::with_capacity(12);
        for piece in entries.values() {
            if seen.contains(piece) {
                return Err(ClassTableError::DuplicatePiece(*piece));
            }
            seen.push(*piece);
        }
        Ok(Self { entries })
    }

    pub fn piece(&self, class_id: u32) -> Option<Piece> {
        self.entries.get(&class_id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Piece)> + '_ {
        self.entries.iter().map(|(&id, &p)| (id, p))
    }
}

impl Default for PieceClassTable {
    /// Label order of the piece detector: black pieces on 1..=6, white on 7..=12.
    fn default() -> Self {
        use Color::{Black, White};
        use PieceKind::*;
        let entries = [
            (1, Piece::new(Black, Bishop)),
            (2, Piece::new(Black, King)),
            (3, Piece::new(Black, Knight)),
            (4, Piece::new(Black, Pawn)),
            (5, Piece::new(Black, Queen)),
            (6, Piece::new(Black, Rook)),
            (7, Piece::new(White, Bishop)),
            (8, Piece::new(White, King)),
            (9, Piece::new(White, Knight)),
            (10, Piece::new(White, Pawn)),
            (11, Piece::new(White, Queen)),
            (12, Piece::new(White, Rook)),
        ];
        Self {
            entries: entries.into_iter().collect(),
        }
    }
}

impl TryFrom<BTreeMap<u32, Piece>> for PieceClassTable {
    type Error = ClassTableError;

    fn try_from(value: BTreeMap<u32, Piece>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PieceClassTable> for BTreeMap<u32, Piece> {
    fn from(value: PieceClassTable) -> Self {
        value.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_round_trip() {
        for piece in Piece::all() {
            assert_eq!(Piece::from_symbol(piece.symbol()), Some(piece));
        }
        assert_eq!(Piece::all().count(), 12);
        assert_eq!(Piece::from_symbol('x'), None);
        assert_eq!(Piece::from_symbol('1'), None);
        assert_eq!(Piece::new(Color::White, PieceKind::Knight).symbol(), 'N');
    }

    #[test]
    fn default_table_matches_detector_labels() {
        let table = PieceClassTable::default();
        let letters: String = (1..=12)
            .map(|id| table.piece(id).unwrap().symbol())
            .collect();
        assert_eq!(letters, "bknpqrBKNPQR");
        assert_eq!(table.piece(0), None);
        assert_eq!(table.piece(13), None);
    }

    #[test]
    fn table_json_uses_class_keys() {
        let json = serde_json::to_string(&PieceClassTable::default()).unwrap();
        assert!(json.starts_with(r#"{"1":"b","2":"k""#), "{json}");
        let back: PieceClassTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PieceClassTable::default());
    }

    #[test]
    fn table_rejects_duplicates_and_wrong_size() {
        let mut entries: Vec<(u32, Piece)> = PieceClassTable::default().iter().collect();
        entries.pop();
        assert_eq!(
            PieceClassTable::new(entries.clone()).unwrap_err(),
            ClassTableError::WrongSize(11)
        );
        entries.push((12, entries[0].1));
        assert!(matches!(
            PieceClassTable::new(entries).unwrap_err(),
            ClassTableError::DuplicatePiece(_)
        ));
    }
}
