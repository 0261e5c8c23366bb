//! Mapping classifier detections onto board squares.

use log::{debug, warn};
use nalgebra::Point2;
use rookeye_core::{BoardSquares, SquareIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{Piece, PieceClassTable, PlacementMap};

/// One piece instance reported by an external classifier, in rectified-canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Box center.
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub width: f32,
    #[serde(default)]
    pub height: f32,
    pub class_id: u32,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl Detection {
    pub fn new(x: f32, y: f32, class_id: u32, confidence: Option<f32>) -> Self {
        Self {
            x,
            y,
            width: 0.0,
            height: 0.0,
            class_id,
            confidence,
        }
    }

    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}

/// Assigner settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignParams {
    pub classes: PieceClassTable,
    /// Detections below this confidence are dropped. Detections without a
    /// confidence always pass.
    pub min_confidence: Option<f32>,
    /// Turn unknown classes and unresolvable square conflicts into errors.
    pub strict: bool,
}

/// A per-detection anomaly that did not stop the assignment.
///
/// `detection` fields are positions in the input slice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssignWarning {
    /// Center outside every square.
    Unmatched { detection: usize, x: f32, y: f32 },
    UnknownPieceClass { detection: usize, class_id: u32 },
    /// Competing detections with equal or missing confidence; the square is left empty.
    AmbiguousSquare {
        square: SquareIndex,
        candidates: Vec<usize>,
    },
    BelowConfidence {
        detection: usize,
        confidence: f32,
        min: f32,
    },
}

impl fmt::Display for AssignWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignWarning::Unmatched { detection, x, y } => write!(
                f,
                "detection #{detection} at ({x:.1}, {y:.1}) is outside every square"
            ),
            AssignWarning::UnknownPieceClass {
                detection,
                class_id,
            } => write!(f, "detection #{detection} has unknown class id {class_id}"),
            AssignWarning::AmbiguousSquare { square, candidates } => write!(
                f,
                "square {square} claimed by detections {candidates:?} with no confidence to break the tie"
            ),
            AssignWarning::BelowConfidence {
                detection,
                confidence,
                min,
            } => write!(
                f,
                "detection #{detection} confidence {confidence:.2} is below {min:.2}"
            ),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AssignError {
    #[error("detection #{detection} has unknown class id {class_id}")]
    UnknownPieceClass { detection: usize, class_id: u32 },
    #[error("square {square} claimed by detections {candidates:?} with no resolvable priority")]
    AmbiguousSquare {
        square: SquareIndex,
        candidates: Vec<usize>,
    },
}

/// How the winner of a square was chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Only one detection landed on the square.
    Sole,
    /// Strictly the most confident detection.
    HigherConfidence,
    /// Top detections tied (or lacked a confidence) but named the same
    /// piece; the first of them was kept.
    AgreeingTie,
}

/// The detection that ended up on a square.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SquareClaim {
    pub square: SquareIndex,
    pub detection: usize,
    pub piece: Piece,
    pub confidence: Option<f32>,
    /// Number of detections whose center fell in this square.
    pub contenders: usize,
    pub resolution: Resolution,
}

/// Result of [`assign_detections`]: the placement plus what happened to every detection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub placement: PlacementMap,
    /// One claim per occupied square, ascending by square.
    pub claims: Vec<SquareClaim>,
    pub warnings: Vec<AssignWarning>,
}

impl Assignment {
    pub fn num_unmatched(&self) -> usize {
        self.count(|w| matches!(w, AssignWarning::Unmatched { .. }))
    }

    pub fn num_unknown_class(&self) -> usize {
        self.count(|w| matches!(w, AssignWarning::UnknownPieceClass { .. }))
    }

    pub fn num_ambiguous(&self) -> usize {
        self.count(|w| matches!(w, AssignWarning::AmbiguousSquare { .. }))
    }

    /// Squares whose winner was picked among equally ranked detections.
    pub fn num_agreeing_ties(&self) -> usize {
        self.claims
            .iter()
            .filter(|c| c.resolution == Resolution::AgreeingTie)
            .count()
    }

    pub fn num_below_confidence(&self) -> usize {
        self.count(|w| matches!(w, AssignWarning::BelowConfidence { .. }))
    }

    fn count(&self, pred: impl Fn(&AssignWarning) -> bool) -> usize {
        self.warnings.iter().filter(|w| pred(w)).count()
    }
}

#[derive(Clone, Copy)]
struct Candidate {
    detection: usize,
    piece: Piece,
    confidence: Option<f32>,
}

/// Place every detection on the square containing its center.
///
/// When several detections land on one square the most confident one wins.
/// If the top confidence is shared (or missing) by detections naming
/// different pieces, the square is ambiguous: an error in strict mode,
/// otherwise a warning and an empty square. Tied detections that agree on
/// the piece are not a conflict.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(squares, detections, params), fields(num_detections = detections.len()))
)]
pub fn assign_detections(
    squares: &BoardSquares,
    detections: &[Detection],
    params: &AssignParams,
) -> Result<Assignment, AssignError> {
    let mut warnings = Vec::new();
    let mut per_square: BTreeMap<SquareIndex, Vec<Candidate>> = BTreeMap::new();

    for (i, det) in detections.iter().enumerate() {
        // NaN or infinite scores rank like a missing one.
        let confidence = det.confidence.filter(|c| c.is_finite());
        if let (Some(min), Some(confidence)) = (params.min_confidence, confidence) {
            if confidence < min {
                debug!("detection #{i} dropped: confidence {confidence:.3} < {min:.3}");
                warnings.push(AssignWarning::BelowConfidence {
                    detection: i,
                    confidence,
                    min,
                });
                continue;
            }
        }

        let Some(piece) = params.classes.piece(det.class_id) else {
            if params.strict {
                return Err(AssignError::UnknownPieceClass {
                    detection: i,
                    class_id: det.class_id,
                });
            }
            warn!("detection #{i} dropped: unknown class id {}", det.class_id);
            warnings.push(AssignWarning::UnknownPieceClass {
                detection: i,
                class_id: det.class_id,
            });
            continue;
        };

        let Some(square) = squares.locate(det.center()) else {
            warn!(
                "detection #{i} dropped: center ({:.1}, {:.1}) outside the board",
                det.x, det.y
            );
            warnings.push(AssignWarning::Unmatched {
                detection: i,
                x: det.x,
                y: det.y,
            });
            continue;
        };

        per_square.entry(square).or_default().push(Candidate {
            detection: i,
            piece,
            confidence,
        });
    }

    let mut placement = PlacementMap::new();
    let mut claims = Vec::with_capacity(per_square.len());
    for (square, candidates) in per_square {
        match resolve(&candidates) {
            Ok((winner, resolution)) => {
                if resolution == Resolution::AgreeingTie {
                    debug!(
                        "square {square}: {} equally ranked detections agree on {}, kept #{}",
                        candidates.len(),
                        winner.piece,
                        winner.detection
                    );
                }
                placement.insert(square, winner.piece);
                claims.push(SquareClaim {
                    square,
                    detection: winner.detection,
                    piece: winner.piece,
                    confidence: winner.confidence,
                    contenders: candidates.len(),
                    resolution,
                });
            }
            Err(tied) => {
                if params.strict {
                    return Err(AssignError::AmbiguousSquare {
                        square,
                        candidates: tied,
                    });
                }
                warn!("square {square} left empty: detections {tied:?} tie");
                warnings.push(AssignWarning::AmbiguousSquare {
                    square,
                    candidates: tied,
                });
            }
        }
    }

    debug!(
        "assigned {} of {} detections ({} warnings)",
        claims.len(),
        detections.len(),
        warnings.len()
    );

    Ok(Assignment {
        placement,
        claims,
        warnings,
    })
}

/// Pick the winner among detections on one square, or return the tied ids.
///
/// Confidences reaching here are finite or `None`.
fn resolve(candidates: &[Candidate]) -> Result<(Candidate, Resolution), Vec<usize>> {
    if let [only] = candidates {
        return Ok((*only, Resolution::Sole));
    }

    // Missing confidences cannot be ranked against anything.
    let top = if candidates.iter().all(|c| c.confidence.is_some()) {
        candidates
            .iter()
            .filter_map(|c| c.confidence)
            .fold(f32::NEG_INFINITY, f32::max)
    } else {
        f32::NAN
    };

    let tied: Vec<&Candidate> = if top.is_nan() {
        candidates.iter().collect()
    } else {
        candidates
            .iter()
            .filter(|c| c.confidence == Some(top))
            .collect()
    };

    match tied.as_slice() {
        [winner] => Ok((**winner, Resolution::HigherConfidence)),
        [head, rest @ ..] if rest.iter().all(|c| c.piece == head.piece) => {
            Ok((**head, Resolution::AgreeingTie))
        }
        _ => Err(tied.iter().map(|c| c.detection).collect()),
    }
}
