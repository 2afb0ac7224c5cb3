use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use passenger_count::{
    CountingPipeline, Direction, FrameSource, ImageSequence, PrecomputedDetections, RunSummary,
    SeatReport, Tally, TrackerConfig, Zone,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Count passengers boarding and alighting a bus", long_about = None)]
struct Args {
    /// Directory of boarding-camera frames, played back in file-name order
    #[arg(long, value_name = "DIR", requires = "board_detections")]
    board_frames: Option<PathBuf>,

    /// JSON file with one detection list per boarding frame
    #[arg(long, value_name = "FILE", requires = "board_frames")]
    board_detections: Option<PathBuf>,

    /// Boarding zone as x1,y1,x2,y2
    #[arg(long, default_value = "0,450,2000,1000")]
    board_zone: Zone,

    /// Directory of alighting-camera frames, played back in file-name order
    #[arg(long, value_name = "DIR", requires = "alight_detections")]
    alight_frames: Option<PathBuf>,

    /// JSON file with one detection list per alighting frame
    #[arg(long, value_name = "FILE", requires = "alight_frames")]
    alight_detections: Option<PathBuf>,

    /// Alighting zone as x1,y1,x2,y2
    #[arg(long, default_value = "0,350,1800,1000")]
    alight_zone: Zone,

    /// Optional JSON tracker configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print a seat-count report for this bus; needs both passes
    #[arg(long, requires_all = ["board_frames", "alight_frames"])]
    bus_id: Option<String>,

    /// Passengers on board before this stop
    #[arg(long, default_value_t = 10)]
    on_board: u32,

    /// Seats on the bus
    #[arg(long, default_value_t = 42)]
    total_seats: u32,

    /// Log per-frame tracking events
    #[arg(short, long)]
    verbose: bool,
}

/// Run one counting pass. An unreadable frame source counts as zero.
fn run_pass<S: FrameSource>(
    frames: S,
    detections: &Path,
    zone: Zone,
    direction: Direction,
    config: &TrackerConfig,
    stop: &AtomicBool,
) -> Result<RunSummary> {
    let detector = PrecomputedDetections::from_json_file(detections)
        .with_context(|| format!("loading detections {}", detections.display()))?;
    info!(%direction, frames = detector.remaining(), "detections loaded");

    let mut pipeline = CountingPipeline::new(detector, config.clone());
    let summary = match pipeline.run_until(frames, zone, direction, stop) {
        Ok(summary) => summary,
        Err(e) => {
            warn!(%direction, error = %e, "could not read frames, count is 0");
            RunSummary {
                direction,
                frames_processed: 0,
                tally: Tally::default(),
                tracks_created: 0,
                active_tracks: 0,
                lost_tracks: 0,
                stopped: false,
            }
        }
    };
    if summary.stopped {
        warn!(%direction, frames = summary.frames_processed, "stopped early, count is partial");
    }
    Ok(summary)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        "passenger_count=debug"
    } else {
        "passenger_count=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => TrackerConfig::from_json_file(path)
            .with_context(|| format!("loading tracker config {}", path.display()))?,
        None => TrackerConfig::default(),
    };

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = Arc::clone(&stop);
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::Relaxed))
        .context("installing Ctrl-C handler")?;

    let boarding = match (&args.board_frames, &args.board_detections) {
        (Some(frames), Some(detections)) => Some(run_pass(
            ImageSequence::new(frames),
            detections,
            args.board_zone,
            Direction::Board,
            &config,
            &stop,
        )?),
        _ => None,
    };
    let alighting = match (&args.alight_frames, &args.alight_detections) {
        (Some(frames), Some(detections)) => Some(run_pass(
            ImageSequence::new(frames),
            detections,
            args.alight_zone,
            Direction::Alight,
            &config,
            &stop,
        )?),
        _ => None,
    };
    if boarding.is_none() && alighting.is_none() {
        anyhow::bail!("nothing to count: pass --board-frames or --alight-frames");
    }

    match (args.bus_id, &boarding, &alighting) {
        (Some(bus_id), Some(boarding), Some(alighting)) => {
            let report = SeatReport::from_runs(bus_id, boarding, alighting);
            let occupancy = report.occupancy(args.on_board, args.total_seats);
            info!(
                boarded = report.boarded,
                alighted = report.alighted,
                on_board = occupancy.on_board,
                available_seats = occupancy.available_seats,
                total_seats = occupancy.total_seats,
                "final report"
            );
            println!("{}", report.to_json()?);
        }
        _ => {
            for summary in boarding.iter().chain(alighting.iter()) {
                println!("{} {}", summary.direction, summary.count());
            }
        }
    }
    Ok(())
}
