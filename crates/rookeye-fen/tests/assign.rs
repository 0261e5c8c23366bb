use rookeye_core::{BoardSquares, Orientation, SquareIndex};
use rookeye_fen::{
    assign_detections, AssignError, AssignParams, AssignWarning, Detection, Fen, SideToMove,
};

const CANVAS: u32 = 800;

fn squares() -> BoardSquares {
    BoardSquares::partition(CANVAS, CANVAS, Orientation::WhiteBottom)
}

/// Center of the canvas cell holding `index` under white-bottom numbering.
fn center_of(index: u32) -> (f32, f32) {
    let c = squares().get(SquareIndex::new(index).unwrap()).center();
    (c.x, c.y)
}

fn strict() -> AssignParams {
    AssignParams {
        strict: true,
        ..AssignParams::default()
    }
}

#[test]
fn higher_confidence_wins_a_shared_square() {
    let (x, y) = center_of(33);
    let dets = [
        Detection::new(x - 10.0, y, 4, Some(0.62)),
        Detection::new(x + 10.0, y + 5.0, 10, Some(0.91)),
    ];
    let out = assign_detections(&squares(), &dets, &strict()).unwrap();
    let a4 = SquareIndex::new(33).unwrap();
    assert_eq!(out.placement.get(a4).map(|p| p.symbol()), Some('P'));
    assert_eq!(out.claims.len(), 1);
    assert_eq!(out.claims[0].detection, 1);
    assert_eq!(out.claims[0].contenders, 2);
    assert!(out.warnings.is_empty());
}

#[test]
fn equal_confidence_on_a_square_is_ambiguous() {
    let (x, y) = center_of(33);
    let dets = [
        Detection::new(x - 10.0, y, 4, Some(0.8)),
        Detection::new(x + 10.0, y, 10, Some(0.8)),
    ];
    let a4 = SquareIndex::new(33).unwrap();

    let err = assign_detections(&squares(), &dets, &strict()).unwrap_err();
    assert_eq!(
        err,
        AssignError::AmbiguousSquare {
            square: a4,
            candidates: vec![0, 1],
        }
    );

    let out = assign_detections(&squares(), &dets, &AssignParams::default()).unwrap();
    assert_eq!(out.placement.get(a4), None);
    assert_eq!(out.num_ambiguous(), 1);
}

#[test]
fn unknown_class_is_dropped_and_the_rest_encoded() {
    // 63 black pawns on every square but h1, plus one unknown class on h1.
    let mut dets: Vec<Detection> = (1..=63)
        .map(|i| {
            let (x, y) = center_of(i);
            Detection::new(x, y, 4, Some(0.9))
        })
        .collect();
    let (x, y) = center_of(64);
    dets.push(Detection::new(x, y, 13, Some(0.95)));

    let out = assign_detections(&squares(), &dets, &AssignParams::default()).unwrap();
    assert_eq!(out.placement.len(), 63);
    assert_eq!(out.num_unknown_class(), 1);
    assert_eq!(
        out.warnings[0],
        AssignWarning::UnknownPieceClass {
            detection: 63,
            class_id: 13,
        }
    );
    let fen = Fen::from_placement(&out.placement, SideToMove::White);
    assert_eq!(
        fen.to_string(),
        "pppppppp/pppppppp/pppppppp/pppppppp/pppppppp/pppppppp/pppppppp/ppppppp1 w - - 0 1"
    );

    assert_eq!(
        assign_detections(&squares(), &dets, &strict()).unwrap_err(),
        AssignError::UnknownPieceClass {
            detection: 63,
            class_id: 13,
        }
    );
}

#[test]
fn detections_off_the_canvas_are_counted() {
    let dets = [
        Detection::new(-5.0, 100.0, 2, Some(0.9)),
        Detection::new(400.0, 800.5, 8, Some(0.9)),
        Detection::new(f32::NAN, 10.0, 8, Some(0.9)),
        Detection::new(400.0, 400.0, 8, Some(0.9)),
    ];
    let out = assign_detections(&squares(), &dets, &strict()).unwrap();
    assert_eq!(out.num_unmatched(), 3);
    assert_eq!(out.placement.len(), 1);
}

#[test]
fn shared_edges_go_to_the_square_right_and_below() {
    // (100, 100) is the corner shared by a8, b8, a7 and b7.
    let out = assign_detections(
        &squares(),
        &[Detection::new(100.0, 100.0, 5, Some(0.9))],
        &AssignParams::default(),
    )
    .unwrap();
    assert_eq!(out.claims[0].square.algebraic(), "b7");

    // The canvas' far corner is still on the board.
    let out = assign_detections(
        &squares(),
        &[Detection::new(800.0, 800.0, 11, Some(0.9))],
        &AssignParams::default(),
    )
    .unwrap();
    assert_eq!(out.claims[0].square.algebraic(), "h1");
}

#[test]
fn black_bottom_flips_the_board() {
    let flipped = BoardSquares::partition(CANVAS, CANVAS, Orientation::BlackBottom);
    // Canvas top-left cell is h1 when black sits at the bottom.
    let dets = [
        Detection::new(50.0, 50.0, 8, Some(0.9)),
        Detection::new(750.0, 750.0, 2, Some(0.9)),
    ];
    let out = assign_detections(&flipped, &dets, &AssignParams::default()).unwrap();
    let fen = Fen::from_placement(&out.placement, SideToMove::Black);
    assert_eq!(fen.to_string(), "k7/8/8/8/8/8/8/7K b - - 0 1");
}
