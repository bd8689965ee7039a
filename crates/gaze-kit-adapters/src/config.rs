//! Layered TOML settings.
//!
//! Two layers are read, later ones winning per key:
//! `~/.config/gaze-kit/config.toml`, then the nearest `.gaze-kit.toml` found
//! walking up from the working directory. The result converts into the core
//! component configs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gaze_kit_core::ports::{Device, ModelFiles};
use gaze_kit_core::{GazeConfig, LandmarkConfig, Point};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::{fs, models};

/// File name of the project-local config.
const PROJECT_CONFIG: &str = ".gaze-kit.toml";

/// Largest accepted `landmarks.eye_half_size`.
pub const MAX_EYE_HALF_SIZE: u32 = 1024;

/// Settings merged from every config layer.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Execution target.
    pub general: GeneralConfig,
    /// Model locations.
    pub models: ModelsConfig,
    /// Landmark postprocessing settings.
    pub landmarks: LandmarksSection,
    /// Gaze postprocessing settings.
    pub gaze: GazeSection,
}

/// `[general]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Target device (`CPU`, `GPU`, `MYRIAD`, `HETERO:...`).
    pub device: Option<String>,
}

/// `[models]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding the registry models.
    pub dir: Option<PathBuf>,
    /// Base path of the landmark model, without extension.
    pub landmarks: Option<PathBuf>,
    /// Base path of the gaze model, without extension.
    pub gaze: Option<PathBuf>,
}

/// `[landmarks]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct LandmarksSection {
    /// Half-size of the eye crop window in pixels.
    pub eye_half_size: Option<u32>,
}

/// `[gaze]` table.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct GazeSection {
    /// Arrow length multiplier.
    pub arrow_scale: Option<f32>,
    /// Font file for the gaze label.
    pub font: Option<PathBuf>,
    /// Label baseline origin as `[x, y]`.
    pub label_origin: Option<[i32; 2]>,
}

impl AppConfig {
    /// Reads the user layer and the project layer for the current directory.
    ///
    /// Unreadable layers are skipped with a warning, and so are invalid
    /// values, which the `to_*` conversions ignore.
    #[must_use]
    pub fn load() -> Self {
        let cwd = std::env::current_dir().ok();
        Self::load_from(xdg_config_path().as_deref(), cwd.as_deref())
    }

    /// Reads `user_file` (if it exists) and then the project layer found
    /// from `project_root`.
    #[must_use]
    pub fn load_from(user_file: Option<&Path>, project_root: Option<&Path>) -> Self {
        let user_layer = user_file.filter(|p| {
            let present = p.is_file();
            if !present {
                debug!("No user config at {}", p.display());
            }
            present
        });
        let project_layer = project_root.and_then(find_project_config);

        let config = user_layer
            .map(Path::to_path_buf)
            .into_iter()
            .chain(project_layer)
            .filter_map(|path| {
                info!("Reading config layer {}", path.display());
                load_file(&path)
            })
            .fold(Self::default(), |mut merged, layer| {
                merged.merge(layer);
                merged
            });

        if let Err(problem) = config.validate() {
            warn!("Ignoring invalid setting: {problem}");
        }

        config
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid value.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(size) = self.landmarks.eye_half_size {
            if !(1..=MAX_EYE_HALF_SIZE).contains(&size) {
                return Err(format!(
                    "landmarks.eye_half_size must be between 1 and {MAX_EYE_HALF_SIZE}, got {size}"
                ));
            }
        }
        if let Some(scale) = self.gaze.arrow_scale {
            if !scale.is_finite() || scale <= 0.0 {
                return Err(format!(
                    "gaze.arrow_scale must be a positive number, got {scale}"
                ));
            }
        }
        if let Some(ref device) = self.general.device {
            if device.trim().is_empty() {
                return Err("general.device must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Overlays `other` on `self`; keys set in `other` win.
    fn merge(&mut self, other: Self) {
        let Self {
            general,
            models,
            landmarks,
            gaze,
        } = other;

        if general.device.is_some() {
            self.general.device = general.device;
        }

        if models.dir.is_some() {
            self.models.dir = models.dir;
        }
        if models.landmarks.is_some() {
            self.models.landmarks = models.landmarks;
        }
        if models.gaze.is_some() {
            self.models.gaze = models.gaze;
        }

        self.landmarks.eye_half_size = landmarks.eye_half_size.or(self.landmarks.eye_half_size);

        self.gaze.arrow_scale = gaze.arrow_scale.or(self.gaze.arrow_scale);
        self.gaze.label_origin = gaze.label_origin.or(self.gaze.label_origin);
        if gaze.font.is_some() {
            self.gaze.font = gaze.font;
        }
    }

    /// Target device, CPU when unset.
    #[must_use]
    pub fn device(&self) -> Device {
        self.general
            .device
            .as_deref()
            .map(|d| d.parse().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Models directory, the XDG data location when unset.
    #[must_use]
    pub fn models_dir(&self) -> PathBuf {
        self.models.dir.clone().unwrap_or_else(models::models_dir)
    }

    /// Landmark model files, from the explicit base path or the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry has no landmark model.
    pub fn landmark_files(&self) -> Result<ModelFiles> {
        self.resolve_files(self.models.landmarks.as_deref(), "landmarks")
    }

    /// Gaze model files, from the explicit base path or the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry has no gaze model.
    pub fn gaze_files(&self) -> Result<ModelFiles> {
        self.resolve_files(self.models.gaze.as_deref(), "gaze")
    }

    fn resolve_files(&self, base: Option<&Path>, name: &str) -> Result<ModelFiles> {
        match base {
            Some(base) => Ok(ModelFiles::from_base(base)),
            None => models::model_files(&self.models_dir(), name)
                .with_context(|| format!("Unknown model: {name}")),
        }
    }

    /// Builds the landmark component configuration.
    #[must_use]
    pub fn to_landmark_config(&self) -> LandmarkConfig {
        let mut config = LandmarkConfig::default();
        if let Some(size) = self
            .landmarks
            .eye_half_size
            .filter(|s| (1..=MAX_EYE_HALF_SIZE).contains(s))
        {
            config = config.with_eye_half_size(size);
        }
        config
    }

    /// Builds the gaze component configuration, loading the label font.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured font cannot be loaded.
    pub fn to_gaze_config(&self) -> Result<GazeConfig> {
        let mut config = GazeConfig::default();
        if let Some(scale) = self
            .gaze
            .arrow_scale
            .filter(|s| s.is_finite() && *s > 0.0)
        {
            config = config.with_arrow_scale(scale);
        }
        if let Some([x, y]) = self.gaze.label_origin {
            config = config.with_label_origin(Point::new(x, y));
        }
        if let Some(ref path) = self.gaze.font {
            let font = fs::load_font(path)
                .with_context(|| format!("Failed to load gaze.font {}", path.display()))?;
            config = config.with_font(font);
        }
        Ok(config)
    }
}

fn xdg_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gaze-kit").join("config.toml"))
}

/// Nearest `.gaze-kit.toml` in `start` or one of its ancestors.
fn find_project_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(PROJECT_CONFIG))
        .find(|candidate| candidate.is_file())
}

fn load_file(path: &Path) -> Option<AppConfig> {
    let parsed = std::fs::read_to_string(path)
        .context("unreadable")
        .and_then(|text| toml::from_str::<AppConfig>(&text).context("invalid TOML"));

    parsed
        .map_err(|e| warn!("Skipping config {}: {e:#}", path.display()))
        .ok()
}
