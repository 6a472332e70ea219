// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ausweis — locate, straighten, and read ID cards from photos.
//
// Entry point. Initialises logging, resolves configuration, runs the detector
// (and the MRZ reader when built with `ocr`), and prints the result as JSON.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use ausweis_core::error::Result;
use ausweis_core::human_errors::humanize_error;
use ausweis_core::{AppConfig, AusweisError, IdFields, IdSummary, Quad};
use ausweis_document::image::processor::save_image;
use ausweis_document::{CandidatePath, CardDetector, Detection, ImageProcessor};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "ausweis")]
#[command(about = "Locate an ID card in a photo, straighten it, and read its MRZ")]
struct Cli {
    /// Photo containing the card (JPEG, PNG, ...)
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// JSON config file (defaults to $XDG_CONFIG_HOME/ausweis/config.json if present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the straightened card to this file
    #[arg(long, value_name = "FILE")]
    crop_out: Option<PathBuf>,

    /// Write the input with the accepted outline drawn on it
    #[arg(long, value_name = "FILE")]
    debug_out: Option<PathBuf>,

    /// Smallest card area as a fraction of the photo
    #[arg(long, value_name = "F")]
    min_area_ratio: Option<f64>,

    /// Lowest accepted width/height ratio of the crop
    #[arg(long, value_name = "F")]
    aspect_min: Option<f64>,

    /// Highest accepted width/height ratio of the crop
    #[arg(long, value_name = "F")]
    aspect_max: Option<f64>,

    /// Only locate the card; skip reading its fields
    #[arg(long)]
    detect_only: bool,

    /// Directory holding the OCR models
    #[arg(long, value_name = "DIR")]
    ocr_models: Option<PathBuf>,
}

/// What `--detect-only` prints.
#[derive(Debug, Serialize)]
struct DetectionReport {
    quad: Quad,
    path: CandidatePath,
    aspect_ratio: f64,
    boundary_area: f64,
    width: u32,
    height: u32,
}

impl From<&Detection> for DetectionReport {
    fn from(detection: &Detection) -> Self {
        Self {
            quad: detection.quad,
            path: detection.path,
            aspect_ratio: detection.aspect_ratio,
            boundary_area: detection.boundary_area,
            width: detection.rectified.width(),
            height: detection.rectified.height(),
        }
    }
}

/// What a full read prints.
#[derive(Debug, Serialize)]
struct ReadReport {
    #[serde(flatten)]
    summary: IdSummary,
    fields: IdFields,
    detection: DetectionReport,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            let human = humanize_error(&err);
            warn!(status = human.status_code(), error = %err, "Request failed");
            eprintln!("{}", human.message);
            eprintln!("{}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<String> {
    let config = resolve_config(cli)?;
    let detector = CardDetector::new(config.detector.clone())?;
    let photo = ImageProcessor::open(&cli.image_path)?;
    info!(
        path = %cli.image_path.display(),
        width = photo.width(),
        height = photo.height(),
        "Ausweis starting"
    );

    if cli.detect_only || !cfg!(feature = "ocr") {
        if !cli.detect_only {
            warn!("Built without the `ocr` feature; only locating the card");
        }
        let detection = detector
            .detect(photo.as_dynamic())?
            .ok_or(AusweisError::CardNotDetected)?;
        write_outputs(cli, &detection)?;
        return Ok(serde_json::to_string_pretty(&DetectionReport::from(&detection))?);
    }

    read_fields(cli, &config, detector, photo)
}

#[cfg(feature = "ocr")]
fn read_fields(
    cli: &Cli,
    config: &AppConfig,
    detector: CardDetector,
    photo: ImageProcessor,
) -> Result<String> {
    use ausweis_document::{IdReader, MrzExtractor, OcrEngine};

    let model_dir = cli.ocr_models.as_deref().or(config.ocr_model_dir.as_deref());
    let engine = OcrEngine::from_model_dir(model_dir)?;
    let reader = IdReader::new(detector, MrzExtractor::new(engine));
    let outcome = reader.read(photo.as_dynamic())?;
    write_outputs(cli, &outcome.detection)?;

    let report = ReadReport {
        summary: outcome.fields.summary(),
        detection: DetectionReport::from(&outcome.detection),
        fields: outcome.fields,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

#[cfg(not(feature = "ocr"))]
fn read_fields(
    _cli: &Cli,
    _config: &AppConfig,
    _detector: CardDetector,
    _photo: ImageProcessor,
) -> Result<String> {
    Err(AusweisError::OcrError(
        "this build has no OCR support; rebuild with `--features ocr`".into(),
    ))
}

/// File config (explicit path, else the default location if it exists), then
/// command-line overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => load_default_config(&AppConfig::default_path())?,
    };

    let detector = &mut config.detector;
    if let Some(ratio) = cli.min_area_ratio {
        detector.min_area_ratio = ratio;
    }
    if let Some(min) = cli.aspect_min {
        detector.aspect_range.min = min;
    }
    if let Some(max) = cli.aspect_max {
        detector.aspect_range.max = max;
    }
    detector.debug = cli.debug_out.is_some();
    detector.validate()?;

    if cli.ocr_models.is_some() && !cfg!(feature = "ocr") {
        warn!("--ocr-models ignored; built without the `ocr` feature");
    }
    Ok(config)
}

fn load_default_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        debug!(path = %path.display(), "Loading config");
        AppConfig::load(path)
    } else {
        Ok(AppConfig::default())
    }
}

fn write_outputs(cli: &Cli, detection: &Detection) -> Result<()> {
    if let Some(path) = &cli.crop_out {
        save_image(&detection.rectified, path)?;
        info!(path = %path.display(), "Crop written");
    }
    if let (Some(path), Some(overlay)) = (&cli.debug_out, &detection.debug) {
        save_image(overlay, path)?;
        info!(path = %path.display(), "Debug overlay written");
    }
    Ok(())
}
