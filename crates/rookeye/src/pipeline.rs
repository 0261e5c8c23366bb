//! End-to-end digitization.

use std::fs;
use std::path::Path;

use image::RgbImage;
use log::{debug, info};
use rookeye_board::{
    rectify_board, BoardDetection, BoardDetector, BoardDetectorParams, DetectError,
    RectifiedBoard, RectifyError, RectifyParams,
};
use rookeye_core::{BoardSquares, ImageView, Orientation};
use rookeye_fen::{
    assign_detections, AssignError, AssignParams, AssignWarning, Assignment, Detection, Fen,
    FenParams, SideToMove,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Boxed error returned by piece classifiers.
pub type ClassifierError = Box<dyn std::error::Error + Send + Sync>;

#[derive(thiserror::Error, Debug)]
pub enum DigitizeError {
    #[error("board detection failed: {0}")]
    Detect(#[from] DetectError),
    #[error("rectification failed: {0}")]
    Rectify(#[from] RectifyError),
    #[error(transparent)]
    Assign(#[from] AssignError),
    #[error("piece classifier failed: {0}")]
    Classifier(#[source] ClassifierError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Every knob of the pipeline. Missing JSON fields take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitizeConfig {
    pub orientation: Orientation,
    pub side_to_move: SideToMove,
    pub detector: BoardDetectorParams,
    pub rectify: RectifyParams,
    pub assign: AssignParams,
    pub fen: FenParams,
}

impl DigitizeConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, DigitizeError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), DigitizeError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Source of piece detections for a rectified board.
///
/// Detections are in rectified-canvas pixels.
pub trait PieceClassifier {
    fn classify(&self, board: &RectifiedBoard) -> Result<Vec<Detection>, ClassifierError>;
}

/// Detections computed elsewhere, e.g. a hosted detector's saved response.
#[derive(Clone, Debug, Default)]
pub struct StaticDetections {
    detections: Vec<Detection>,
}

impl StaticDetections {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl PieceClassifier for StaticDetections {
    fn classify(&self, _board: &RectifiedBoard) -> Result<Vec<Detection>, ClassifierError> {
        Ok(self.detections.clone())
    }
}

impl<F> PieceClassifier for F
where
    F: Fn(&RectifiedBoard) -> Result<Vec<Detection>, ClassifierError>,
{
    fn classify(&self, board: &RectifiedBoard) -> Result<Vec<Detection>, ClassifierError> {
        self(board)
    }
}

/// Everything one pipeline run produced.
#[derive(Clone, Debug)]
pub struct Digitization {
    pub detection: BoardDetection,
    pub rectified: RectifiedBoard,
    pub squares: BoardSquares,
    pub assignment: Assignment,
    pub fen: Fen,
    pub link: String,
}

impl Digitization {
    pub fn warnings(&self) -> &[AssignWarning] {
        &self.assignment.warnings
    }
}

/// Borrow an `image::RgbImage` as a three-channel core view.
pub fn rgb_view(img: &RgbImage) -> ImageView<'_> {
    ImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        channels: 3,
        data: img.as_raw(),
    }
}

/// Runs the pipeline with one fixed configuration. Holds no per-image state.
pub struct Digitizer {
    config: DigitizeConfig,
    detector: BoardDetector,
}

impl Digitizer {
    pub fn new(config: DigitizeConfig) -> Self {
        let detector = BoardDetector::new(config.detector.clone());
        Self { config, detector }
    }

    pub fn config(&self) -> &DigitizeConfig {
        &self.config
    }

    /// Find the board outline and rectify it.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, photo), fields(width = photo.width(), height = photo.height()))
    )]
    pub fn locate_board(
        &self,
        photo: &RgbImage,
    ) -> Result<(BoardDetection, RectifiedBoard), DigitizeError> {
        let gray = image::imageops::grayscale(photo);
        let detection = self.detector.detect(&gray)?;
        debug!(
            "board corners {:?} (area {:.3} of image)",
            detection.corners.to_array(),
            detection.area_frac
        );
        let rectified = rectify_board(&rgb_view(photo), &detection.corners, &self.config.rectify)?;
        Ok((detection, rectified))
    }

    /// Assign detections to squares and encode the position.
    pub fn assemble(
        &self,
        squares: &BoardSquares,
        detections: &[Detection],
    ) -> Result<(Assignment, Fen, String), DigitizeError> {
        let assignment = assign_detections(squares, detections, &self.config.assign)?;
        let fen = Fen::from_placement(&assignment.placement, self.config.side_to_move);
        let link = fen.analysis_link(&self.config.fen.analysis_base_url);
        Ok((assignment, fen, link))
    }

    /// Full pipeline: photo -> board -> squares -> detections -> FEN.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, photo, classifier), fields(width = photo.width(), height = photo.height()))
    )]
    pub fn digitize(
        &self,
        photo: &RgbImage,
        classifier: &dyn PieceClassifier,
    ) -> Result<Digitization, DigitizeError> {
        let (detection, rectified) = self.locate_board(photo)?;
        let squares = rectified.squares(self.config.orientation);
        let detections = classifier
            .classify(&rectified)
            .map_err(DigitizeError::Classifier)?;
        let (assignment, fen, link) = self.assemble(&squares, &detections)?;
        info!(
            "{} pieces placed from {} detections, {} warnings",
            assignment.placement.len(),
            detections.len(),
            assignment.warnings.len()
        );

        Ok(Digitization {
            detection,
            rectified,
            squares,
            assignment,
            fen,
            link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_json_fills_defaults() {
        let cfg: DigitizeConfig = serde_json::from_str(
            r#"{ "orientation": "black-bottom", "side_to_move": "black", "rectify": { "size_px": 400 } }"#,
        )
        .unwrap();
        assert_eq!(cfg.orientation, Orientation::BlackBottom);
        assert_eq!(cfg.side_to_move, SideToMove::Black);
        assert_eq!(cfg.rectify.size_px, 400);
        assert_eq!(cfg.detector, BoardDetectorParams::default());
        assert_eq!(cfg.assign, AssignParams::default());
    }

    #[test]
    fn config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let cfg = DigitizeConfig {
            orientation: Orientation::BlackBottom,
            assign: AssignParams {
                strict: true,
                min_confidence: Some(0.7),
                ..AssignParams::default()
            },
            ..DigitizeConfig::default()
        };
        cfg.write_json(&path).unwrap();
        assert_eq!(DigitizeConfig::load_json(&path).unwrap(), cfg);
    }

    #[test]
    fn assemble_without_a_photo() {
        let digitizer = Digitizer::new(DigitizeConfig::default());
        let squares = BoardSquares::partition(800, 800, Orientation::WhiteBottom);
        let (assignment, fen, link) = digitizer
            .assemble(&squares, &[Detection::new(50.0, 750.0, 12, Some(0.9))])
            .unwrap();
        assert_eq!(assignment.claims.len(), 1);
        assert_eq!(fen.to_string(), "8/8/8/8/8/8/8/R7 w - - 0 1");
        assert_eq!(
            link,
            "https://lichess.org/analysis/standard/8/8/8/8/8/8/8/R7%20w"
        );
    }

    #[test]
    fn detection_failure_yields_no_result() {
        let photo = RgbImage::from_pixel(200, 150, image::Rgb([128, 128, 128]));
        let digitizer = Digitizer::new(DigitizeConfig::default());
        let err = digitizer
            .digitize(&photo, &StaticDetections::default())
            .unwrap_err();
        assert!(matches!(err, DigitizeError::Detect(_)), "{err}");
    }
}
