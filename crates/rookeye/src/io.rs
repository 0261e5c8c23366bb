//! JSON predictions, reports and image export.

use std::fs;
use std::path::Path;

use image::RgbImage;
use rookeye_board::RectifiedBoard;
use rookeye_core::{BoardQuad, Image};
use rookeye_fen::{AssignWarning, Detection, PlacementMap, SideToMove, SquareClaim};
use serde::{Deserialize, Serialize};

use crate::Digitization;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("prediction #{index} has non-numeric class {class:?}")]
    InvalidClass { index: usize, class: String },
    #[error("rectified image has {0} channels (expected 3)")]
    UnsupportedChannels(usize),
}

/// Class label as the hosted detector reports it: a number or a numeric string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum ClassLabel {
    Id(u32),
    Text(String),
}

#[derive(Clone, Debug, Deserialize)]
struct Prediction {
    x: f32,
    y: f32,
    #[serde(default)]
    width: f32,
    #[serde(default)]
    height: f32,
    class: ClassLabel,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionsFile {
    Wrapped { predictions: Vec<Prediction> },
    Bare(Vec<Prediction>),
}

/// Parse `{"predictions": [...]}` or a bare array of predictions.
pub fn parse_predictions(json: &str) -> Result<Vec<Detection>, IoError> {
    let predictions = match serde_json::from_str(json)? {
        PredictionsFile::Wrapped { predictions } => predictions,
        PredictionsFile::Bare(predictions) => predictions,
    };

    predictions
        .into_iter()
        .enumerate()
        .map(|(index, p)| {
            let class_id = match p.class {
                ClassLabel::Id(id) => id,
                ClassLabel::Text(text) => text
                    .trim()
                    .parse()
                    .map_err(|_| IoError::InvalidClass { index, class: text })?,
            };
            Ok(Detection {
                x: p.x,
                y: p.y,
                width: p.width,
                height: p.height,
                class_id,
                confidence: p.confidence,
            })
        })
        .collect()
}

pub fn load_predictions(path: impl AsRef<Path>) -> Result<Vec<Detection>, IoError> {
    parse_predictions(&fs::read_to_string(path)?)
}

/// Read a `{ "1": "r", ... }` placement map.
pub fn load_placement(path: impl AsRef<Path>) -> Result<PlacementMap, IoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Machine-readable summary of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DigitizeReport {
    pub corners: BoardQuad,
    pub area_frac: f32,
    pub size_px: u32,
    pub fen: String,
    pub side_to_move: SideToMove,
    pub link: String,
    pub placement: PlacementMap,
    pub claims: Vec<SquareClaim>,
    pub warnings: Vec<AssignWarning>,
    /// Grid-line intersections in source pixels, row-major, 9x9.
    pub lattice: Vec<[f32; 2]>,
}

impl DigitizeReport {
    pub fn from_digitization(result: &Digitization) -> Self {
        Self {
            corners: result.detection.corners,
            area_frac: result.detection.area_frac,
            size_px: result.rectified.size_px,
            fen: result.fen.to_string(),
            side_to_move: result.fen.side_to_move,
            link: result.link.clone(),
            placement: result.assignment.placement.clone(),
            claims: result.assignment.claims.clone(),
            warnings: result.assignment.warnings.clone(),
            lattice: result
                .rectified
                .lattice_in_image()
                .into_iter()
                .map(|p| [p.x, p.y])
                .collect(),
        }
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Copy a three-channel core image into an `image::RgbImage`.
pub fn to_rgb_image(img: &Image) -> Result<RgbImage, IoError> {
    if img.channels != 3 {
        return Err(IoError::UnsupportedChannels(img.channels));
    }
    RgbImage::from_raw(img.width as u32, img.height as u32, img.data.clone())
        .ok_or(IoError::UnsupportedChannels(img.channels))
}

/// Save the rectified canvas; the format follows the file extension.
pub fn export_rectified(board: &RectifiedBoard, path: impl AsRef<Path>) -> Result<(), IoError> {
    to_rgb_image(&board.image)?.save(path)?;
    Ok(())
}
