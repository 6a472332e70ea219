// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detector and application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AusweisError, Result};

const CONFIG_FILE: &str = "config.json";

/// Inclusive bounds on the accepted width / height ratio of a rectified card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AspectRange {
    pub min: f64,
    pub max: f64,
}

impl AspectRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `ratio` lies within the range (both ends inclusive).
    pub fn contains(&self, ratio: f64) -> bool {
        self.min <= ratio && ratio <= self.max
    }
}

impl Default for AspectRange {
    /// ID-1 cards are 85.6 x 54 mm (≈1.59); the range is wide enough to
    /// tolerate residual perspective and loose crops.
    fn default() -> Self {
        Self { min: 1.2, max: 2.8 }
    }
}

/// Tuning knobs for card localisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Boundaries enclosing less than this fraction of the image are ignored.
    pub min_area_ratio: f64,
    /// Absolute lower bound on boundary area, in square pixels.
    pub min_area_floor: f64,
    /// Accepted width / height ratio of the rectified output.
    pub aspect_range: AspectRange,
    /// Gaussian smoothing sigma (1.1 matches a 5x5 kernel).
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Half-width of the square structuring element used to close edge gaps.
    pub close_radius: u8,
    /// Number of dilate / erode passes in the closing.
    pub close_iterations: u8,
    /// Polygon approximation tolerance as a fraction of the boundary perimeter.
    pub approx_epsilon_ratio: f64,
    /// Return an annotated copy of the input alongside the detection.
    pub debug: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.01,
            min_area_floor: 1000.0,
            aspect_range: AspectRange::default(),
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            close_radius: 2,
            close_iterations: 2,
            approx_epsilon_ratio: 0.02,
            debug: false,
        }
    }
}

impl DetectorConfig {
    pub fn with_min_area_ratio(mut self, ratio: f64) -> Self {
        self.min_area_ratio = ratio;
        self
    }

    pub fn with_aspect_range(mut self, min: f64, max: f64) -> Self {
        self.aspect_range = AspectRange::new(min, max);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Minimum boundary area for an image of `width` x `height` pixels.
    pub fn min_area(&self, width: u32, height: u32) -> f64 {
        let image_area = width as f64 * height as f64;
        self.min_area_floor.max(self.min_area_ratio * image_area)
    }

    /// Reject settings that would make detection meaningless.
    pub fn validate(&self) -> Result<()> {
        if !self.min_area_ratio.is_finite() || !(0.0..=1.0).contains(&self.min_area_ratio) {
            return Err(AusweisError::Config(format!(
                "min_area_ratio must be in [0, 1], got {}",
                self.min_area_ratio
            )));
        }
        if !self.min_area_floor.is_finite() || self.min_area_floor < 0.0 {
            return Err(AusweisError::Config(format!(
                "min_area_floor must be a non-negative number, got {}",
                self.min_area_floor
            )));
        }
        let AspectRange { min, max } = self.aspect_range;
        if !min.is_finite() || !max.is_finite() || min <= 0.0 || min > max {
            return Err(AusweisError::Config(format!(
                "aspect_range must satisfy 0 < min <= max, got ({min}, {max})"
            )));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma <= 0.0 {
            return Err(AusweisError::Config(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if !self.canny_low.is_finite()
            || !self.canny_high.is_finite()
            || self.canny_low < 0.0
            || self.canny_low > self.canny_high
        {
            return Err(AusweisError::Config(format!(
                "canny thresholds must satisfy 0 <= low <= high, got ({}, {})",
                self.canny_low, self.canny_high
            )));
        }
        if !self.approx_epsilon_ratio.is_finite() || self.approx_epsilon_ratio <= 0.0 {
            return Err(AusweisError::Config(format!(
                "approx_epsilon_ratio must be positive, got {}",
                self.approx_epsilon_ratio
            )));
        }
        Ok(())
    }
}

/// Persistent application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Card detector settings.
    pub detector: DetectorConfig,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`.
    /// `None` means the default OCR model cache.
    pub ocr_model_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Default location of the config file: `$XDG_CONFIG_HOME/ausweis/config.json`,
    /// falling back to `~/.config/ausweis/config.json`.
    pub fn default_path() -> PathBuf {
        let base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg)
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config")
        } else {
            // Last resort — current directory.
            PathBuf::from(".")
        };
        base.join("ausweis").join(CONFIG_FILE)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&json)?;
        config.detector.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_id1_card_detection() {
        let config = DetectorConfig::default();
        assert_eq!(config.min_area_ratio, 0.01);
        assert_eq!(config.aspect_range, AspectRange::new(1.2, 2.8));
        assert_eq!(config.approx_epsilon_ratio, 0.02);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn min_area_uses_floor_for_small_images() {
        let config = DetectorConfig::default();
        // 200x200 * 1% = 400 < floor of 1000.
        assert_eq!(config.min_area(200, 200), 1000.0);
        // 800x500 * 1% = 4000.
        assert_eq!(config.min_area(800, 500), 4000.0);
    }

    #[test]
    fn aspect_range_is_inclusive() {
        let range = AspectRange::new(1.2, 2.8);
        assert!(range.contains(1.2));
        assert!(range.contains(2.8));
        assert!(!range.contains(1.0));
        assert!(!range.contains(3.0));
    }

    #[test]
    fn validate_rejects_inverted_aspect_range() {
        let config = DetectorConfig::default().with_aspect_range(2.0, 1.0);
        assert!(matches!(config.validate(), Err(AusweisError::Config(_))));
    }

    #[test]
    fn validate_rejects_non_finite_canny_thresholds() {
        let mut config = DetectorConfig::default();
        config.canny_low = f32::NAN;
        assert!(matches!(config.validate(), Err(AusweisError::Config(_))));

        let mut config = DetectorConfig::default();
        config.canny_high = f32::NAN;
        assert!(matches!(config.validate(), Err(AusweisError::Config(_))));

        let mut config = DetectorConfig::default();
        config.canny_high = f32::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_ratio() {
        let config = DetectorConfig::default().with_min_area_ratio(1.5);
        assert!(config.validate().is_err());
        let config = DetectorConfig::default().with_min_area_ratio(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "detector": { "min_area_ratio": 0.05 } }"#).unwrap();
        assert_eq!(config.detector.min_area_ratio, 0.05);
        assert_eq!(config.detector.aspect_range, AspectRange::default());
        assert!(config.ocr_model_dir.is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = AppConfig {
            detector: DetectorConfig::default().with_debug(true),
            ocr_model_dir: Some(PathBuf::from("/opt/models")),
        };
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_rejects_invalid_detector_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "detector": { "approx_epsilon_ratio": 0.0 } }"#).unwrap();
        assert!(matches!(AppConfig::load(&path), Err(AusweisError::Config(_))));
    }

    #[test]
    fn default_path_ends_with_config_file() {
        assert!(AppConfig::default_path().ends_with("ausweis/config.json"));
    }
}
