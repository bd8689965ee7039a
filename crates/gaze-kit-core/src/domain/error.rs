//! Error taxonomy shared by the components and the inference port.

use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;

/// Result alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading models or running a prediction.
///
/// A failed `predict` never leaves a partially annotated frame behind: every
/// fallible step runs before the first pixel is drawn.
#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Model files are missing or could not be parsed.
    ModelLoad {
        /// Path of the file that failed to load.
        path: PathBuf,
        /// Underlying cause reported by the runtime or filesystem.
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The model contains layers the target device cannot execute.
    UnsupportedLayers {
        /// Device the model was validated against.
        device: String,
        /// Names of the offending layers.
        layers: Vec<String>,
    },
    /// The inference runtime failed while executing a request.
    Inference(String),
    /// The model declares inputs or outputs this component cannot use.
    InvalidModel(String),
    /// The model produced an output with an unexpected shape.
    InvalidOutput(String),
    /// A caller-provided argument is unusable (e.g. an empty image).
    InvalidInput(String),
}

impl Error {
    /// Builds a `ModelLoad` error from any error type.
    pub fn model_load(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::ModelLoad {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Returns the unsupported layer names, if this is an `UnsupportedLayers` error.
    #[must_use]
    pub fn unsupported_layers(&self) -> Option<&[String]> {
        match self {
            Self::UnsupportedLayers { layers, .. } => Some(layers),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoad { path, source } => {
                write!(f, "could not load model {}: {source}", path.display())
            }
            Self::UnsupportedLayers { device, layers } => write!(
                f,
                "unsupported layers for device {device}: {}",
                layers.join(", ")
            ),
            Self::Inference(msg) => write!(f, "inference failed: {msg}"),
            Self::InvalidModel(msg) => write!(f, "invalid model: {msg}"),
            Self::InvalidOutput(msg) => write!(f, "invalid model output: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::ModelLoad { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
