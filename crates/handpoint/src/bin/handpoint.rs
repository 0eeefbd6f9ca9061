//! Offline tools: solve a recorded calibration session, project a single ray.

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand};
use handpoint::calib::{
    load_capture_log, solve, CalibrationError, CalibrationFile, CalibrationIoError,
    CalibrationParams, CornerSamples,
};
use handpoint::{project, to_pixels};
use log::LevelFilter;
use nalgebra::Point3;
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(name = "handpoint", version, about = "Marker-less screen pointing tools")]
struct Cli {
    /// Log verbosity.
    #[arg(long, default_value = "info", global = true)]
    log_level: LevelFilter,
    /// Emit JSON log lines (requires the `tracing` feature).
    #[arg(long, global = true)]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a screen calibration from a JSON capture log.
    Solve {
        #[arg(long)]
        captures: PathBuf,
        /// Where to write the calibration file.
        #[arg(long)]
        out: PathBuf,
        /// JSON file with calibration parameters.
        #[arg(long)]
        params: Option<PathBuf>,
        #[arg(long)]
        median_iterations: Option<usize>,
    },
    /// Project the head-to-fingertip ray onto a stored calibration.
    Project {
        #[arg(long)]
        calibration: PathBuf,
        /// Head position as `x,y,z` in metres.
        #[arg(long, allow_hyphen_values = true)]
        head: Vec3Arg,
        /// Fingertip position as `x,y,z` in metres.
        #[arg(long, allow_hyphen_values = true)]
        fingertip: Vec3Arg,
        /// Display size in pixels as `WIDTHxHEIGHT`.
        #[arg(long)]
        display: Option<DisplayArg>,
    },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    CalibrationIo(#[from] CalibrationIoError),
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

#[derive(Clone, Copy, Debug)]
struct Vec3Arg(Point3<f32>);

impl FromStr for Vec3Arg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<f32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid coordinate in '{s}': {e}"))?;
        match parts.as_slice() {
            [x, y, z] => Ok(Self(Point3::new(*x, *y, *z))),
            _ => Err(format!("expected x,y,z, got '{s}'")),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct DisplayArg {
    width: u32,
    height: u32,
}

impl FromStr for DisplayArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let parse = |v: &str| v.parse::<u32>().map_err(|e| format!("'{v}': {e}"));
        Ok(Self {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

#[derive(Serialize)]
struct ProjectOutput {
    valid: bool,
    normalized: [f32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pixels: Option<[f32; 2]>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.log_json);
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter, json: bool) {
    if json {
        eprintln!("--log-json needs the `tracing` feature; using plain logs");
    }
    let _ = handpoint::core::init_with_level(level);
}

#[cfg(feature = "tracing")]
fn init_logging(_level: LevelFilter, json: bool) {
    let _ = tracing_log::LogTracer::init();
    handpoint::core::init_tracing(json);
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Solve {
            captures,
            out,
            params,
            median_iterations,
        } => run_solve(captures, out, params, median_iterations),
        Command::Project {
            calibration,
            head,
            fingertip,
            display,
        } => run_project(calibration, head.0, fingertip.0, display),
    }
}

fn run_solve(
    captures: PathBuf,
    out: PathBuf,
    params: Option<PathBuf>,
    median_iterations: Option<usize>,
) -> Result<(), CliError> {
    let mut params = match params {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => CalibrationParams::default(),
    };
    if let Some(iters) = median_iterations {
        params.median_iterations = iters;
    }

    let records = load_capture_log(&captures)?;
    log::info!("loaded {} captures from {}", records.len(), captures.display());
    let samples = CornerSamples::from_records(&records, params.median_iterations)?;
    let result = solve(&samples, &params)?;

    CalibrationFile::from_result(&result).write_json(&out)?;
    log::info!("wrote {}", out.display());
    println!("{}", serde_json::to_string_pretty(&result.report)?);
    Ok(())
}

fn run_project(
    calibration: PathBuf,
    head: Point3<f32>,
    fingertip: Point3<f32>,
    display: Option<DisplayArg>,
) -> Result<(), CliError> {
    let model = CalibrationFile::load_json(&calibration)?.model()?;
    let result = project(head, fingertip, &model);
    let pixels = display.map(|d| {
        let p = to_pixels(&result.normalized, d.width, d.height);
        [p.x, p.y]
    });
    let output = ProjectOutput {
        valid: result.valid,
        normalized: [result.normalized.x, result.normalized.y],
        pixels,
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}
