//! Model registry and on-disk locations.

use std::path::{Path, PathBuf};

use gaze_kit_core::ports::ModelFiles;
use tracing::debug;

/// Model metadata.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Short name used in configuration.
    pub name: &'static str,
    /// File base name inside the models directory, without extension.
    pub base_name: &'static str,
    /// What the model produces.
    pub description: &'static str,
}

/// Known models.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "landmarks",
        base_name: "landmarks-regression-retail-0009",
        description: "five facial landmarks, normalized to the face crop",
    },
    ModelInfo {
        name: "gaze",
        base_name: "gaze-estimation-adas-0002",
        description: "3-D gaze vector from both eyes and head pose",
    },
];

/// Returns the models directory path.
///
/// Uses `XDG_DATA_HOME/gaze-kit/models` or `~/.local/share/gaze-kit/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gaze-kit")
        .join("models")
}

/// Returns the file pair of a known model inside `dir`.
#[must_use]
pub fn model_files(dir: &Path, name: &str) -> Option<ModelFiles> {
    MODELS
        .iter()
        .find(|m| m.name == name)
        .map(|m| ModelFiles::from_base(dir.join(m.base_name)))
}

/// Checks if all known models are installed in `dir`.
#[must_use]
pub fn all_models_installed(dir: &Path) -> bool {
    MODELS
        .iter()
        .all(|m| ModelFiles::from_base(dir.join(m.base_name)).exists())
}

/// Lists known models with their installation status in `dir`.
#[must_use]
pub fn list_models(dir: &Path) -> Vec<(String, bool)> {
    MODELS
        .iter()
        .map(|m| {
            let installed = ModelFiles::from_base(dir.join(m.base_name)).exists();
            debug!("Model {} installed: {}", m.name, installed);
            (m.name.to_string(), installed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_dir() {
        let dir = models_dir();
        assert!(dir.ends_with("gaze-kit/models"));
    }

    #[test]
    fn test_model_files() {
        let files = model_files(Path::new("/opt/models"), "gaze")
            .unwrap_or_else(|| panic!("gaze should be a known model"));
        assert_eq!(
            files.topology,
            PathBuf::from("/opt/models/gaze-estimation-adas-0002.onnx")
        );
        assert_eq!(
            files.weights,
            PathBuf::from("/opt/models/gaze-estimation-adas-0002.onnx.data")
        );
    }

    #[test]
    fn test_model_files_unknown() {
        assert!(model_files(Path::new("/opt/models"), "head-pose").is_none());
    }

    #[test]
    fn test_nothing_installed_in_missing_dir() {
        let dir = Path::new("/definitely/not/a/models/dir");
        assert!(!all_models_installed(dir));
        assert_eq!(
            list_models(dir),
            vec![("landmarks".to_string(), false), ("gaze".to_string(), false)]
        );
    }
}
