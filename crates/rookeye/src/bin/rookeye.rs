//! rookeye CLI: chessboard photo -> FEN.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use rookeye::fen::{Fen, FenParams, SideToMove};
use rookeye::io::{self, DigitizeReport};
use rookeye::{DigitizeConfig, Digitizer, Orientation, StaticDetections};
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "rookeye")]
#[command(about = "Digitize a photographed chessboard into FEN and an analysis-board link")]
#[command(version)]
struct Cli {
    /// Log verbosity (off, error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the board outline and rectify it.
    Locate(LocateArgs),

    /// Run the full pipeline with saved classifier predictions.
    Digitize(DigitizeArgs),

    /// Encode a JSON placement map (`{"1": "r", ...}`) as FEN.
    Encode {
        /// Path to the placement map.
        #[arg(long)]
        placement: PathBuf,

        /// Black is to move.
        #[arg(long)]
        black_to_move: bool,
    },
}

#[derive(Debug, Clone, Args)]
struct LocateArgs {
    /// Path to the photograph.
    #[arg(long)]
    image: PathBuf,

    /// Pipeline config (JSON); defaults are used for missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the rectified board image here.
    #[arg(long)]
    rectified_out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct DigitizeArgs {
    #[command(flatten)]
    locate: LocateArgs,

    /// Classifier predictions (JSON) in rectified-image pixels.
    #[arg(long)]
    detections: PathBuf,

    /// Which side sits at the bottom of the photo. Overrides the config.
    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Black is to move. Overrides the config.
    #[arg(long)]
    black_to_move: bool,

    /// Fail on unknown classes and ambiguous squares instead of warning.
    #[arg(long)]
    strict: bool,

    /// Write a JSON report here.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrientationArg {
    WhiteBottom,
    BlackBottom,
}

impl From<OrientationArg> for Orientation {
    fn from(value: OrientationArg) -> Self {
        match value {
            OrientationArg::WhiteBottom => Orientation::WhiteBottom,
            OrientationArg::BlackBottom => Orientation::BlackBottom,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    init_logging(cli.log_level)?;

    match cli.command {
        Commands::Locate(args) => run_locate(&args),
        Commands::Digitize(args) => run_digitize(&args),
        Commands::Encode {
            placement,
            black_to_move,
        } => run_encode(&placement, black_to_move),
    }
}

#[cfg(feature = "tracing")]
fn init_logging(level: LevelFilter) -> CliResult<()> {
    rookeye::core::init_tracing(false, level);
    tracing_log::LogTracer::init_with_filter(level)?;
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter) -> CliResult<()> {
    rookeye::core::init_with_level(level)?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> CliResult<DigitizeConfig> {
    match path {
        Some(path) => Ok(DigitizeConfig::load_json(path)?),
        None => Ok(DigitizeConfig::default()),
    }
}

fn side_from_flag(black_to_move: bool) -> SideToMove {
    if black_to_move {
        SideToMove::Black
    } else {
        SideToMove::White
    }
}

fn run_locate(args: &LocateArgs) -> CliResult<()> {
    let config = load_config(args.config.as_deref())?;
    let photo = image::open(&args.image)?.to_rgb8();
    let (detection, rectified) = Digitizer::new(config).locate_board(&photo)?;

    for (name, p) in ["top_left", "top_right", "bottom_right", "bottom_left"]
        .iter()
        .zip(detection.corners.to_array())
    {
        println!("{name}: {:.1} {:.1}", p.x, p.y);
    }
    println!("area_frac: {:.3}", detection.area_frac);

    if let Some(out) = &args.rectified_out {
        io::export_rectified(&rectified, out)?;
        println!("rectified: {}", out.display());
    }
    Ok(())
}

fn run_digitize(args: &DigitizeArgs) -> CliResult<()> {
    let mut config = load_config(args.locate.config.as_deref())?;
    if let Some(orientation) = args.orientation {
        config.orientation = orientation.into();
    }
    if args.black_to_move {
        config.side_to_move = SideToMove::Black;
    }
    if args.strict {
        config.assign.strict = true;
    }

    let photo = image::open(&args.locate.image)?.to_rgb8();
    let detections = io::load_predictions(&args.detections)?;
    let result = Digitizer::new(config).digitize(&photo, &StaticDetections::new(detections))?;

    if let Some(out) = &args.locate.rectified_out {
        io::export_rectified(&result.rectified, out)?;
    }
    if let Some(out) = &args.report {
        DigitizeReport::from_digitization(&result).write_json(out)?;
    }

    for warning in result.warnings() {
        eprintln!("warning: {warning}");
    }
    println!("FEN: {}", result.fen);
    println!("Link: {}", result.link);
    Ok(())
}

fn run_encode(placement: &Path, black_to_move: bool) -> CliResult<()> {
    let map = io::load_placement(placement)?;
    let fen = Fen::from_placement(&map, side_from_flag(black_to_move));
    println!("FEN: {fen}");
    println!(
        "Link: {}",
        fen.analysis_link(&FenParams::default().analysis_base_url)
    );
    Ok(())
}
