//! Inference port: load a model for a device and run named-tensor requests.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::ArrayD;

use crate::domain::Result;

/// Extension of the network topology file.
pub const TOPOLOGY_EXTENSION: &str = "onnx";
/// Extension of the weights sidecar file.
pub const WEIGHTS_EXTENSION: &str = "onnx.data";

/// Topology and weights files of one model, addressed by a shared base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    /// Network topology file.
    pub topology: PathBuf,
    /// Weights file. Optional on disk when the topology embeds its weights.
    pub weights: PathBuf,
}

impl ModelFiles {
    /// Derives both paths from a base path without extension.
    ///
    /// `models/gaze-estimation-adas-0002` becomes
    /// `models/gaze-estimation-adas-0002.onnx` and
    /// `models/gaze-estimation-adas-0002.onnx.data`.
    #[must_use]
    pub fn from_base(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref().as_os_str();
        let with_suffix = |ext: &str| {
            let mut path = base.to_os_string();
            path.push(".");
            path.push(ext);
            PathBuf::from(path)
        };

        Self {
            topology: with_suffix(TOPOLOGY_EXTENSION),
            weights: with_suffix(WEIGHTS_EXTENSION),
        }
    }

    /// Returns true if the topology file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.topology.is_file()
    }
}

/// Execution target for a model.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Device {
    /// Plain CPU execution.
    #[default]
    Cpu,
    /// A named accelerator (`GPU`, `MYRIAD`, `HETERO:GPU,CPU`, ...).
    Accelerator(String),
}

impl FromStr for Device {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("cpu") {
            Ok(Self::Cpu)
        } else {
            Ok(Self::Accelerator(s.to_ascii_uppercase()))
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("CPU"),
            Self::Accelerator(name) => f.write_str(name),
        }
    }
}

/// Declared name and shape of a model input or output.
///
/// Dynamic dimensions are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorInfo {
    /// Tensor name.
    pub name: String,
    /// Declared dimensions.
    pub shape: Vec<Option<usize>>,
}

impl TensorInfo {
    /// Creates tensor info with fully static dimensions.
    #[must_use]
    pub fn fixed(name: impl Into<String>, shape: &[usize]) -> Self {
        Self {
            name: name.into(),
            shape: shape.iter().copied().map(Some).collect(),
        }
    }

    /// Returns the spatial `(height, width)` of an NCHW input, if both are static.
    #[must_use]
    pub fn nchw_spatial(&self) -> Option<(usize, usize)> {
        match self.shape.as_slice() {
            [_, _, Some(h), Some(w)] => Some((*h, *w)),
            _ => None,
        }
    }
}

/// A tensor together with the model input/output name it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTensor {
    /// Tensor name.
    pub name: String,
    /// Tensor values.
    pub data: ArrayD<f32>,
}

impl NamedTensor {
    /// Creates a named tensor.
    #[must_use]
    pub fn new(name: impl Into<String>, data: ArrayD<f32>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// Port for inference runtimes.
///
/// Runtime capability negotiation (which execution provider or loader to
/// use) happens once when the engine is constructed, not per call.
pub trait InferenceEngine: Send + Sync {
    /// Reads a model, validates it against `device` and compiles it.
    ///
    /// # Errors
    ///
    /// - [`Error::ModelLoad`](crate::Error::ModelLoad) if the files are
    ///   missing or cannot be parsed
    /// - [`Error::UnsupportedLayers`](crate::Error::UnsupportedLayers) if the
    ///   device cannot run some layers
    fn load(&self, files: &ModelFiles, device: &Device) -> Result<Box<dyn CompiledModel>>;
}

/// A model ready to execute requests.
///
/// `infer` takes `&mut self`: one request runs at a time per instance.
pub trait CompiledModel: Send {
    /// Declared inputs in model order.
    fn inputs(&self) -> &[TensorInfo];

    /// Declared outputs in model order.
    fn outputs(&self) -> &[TensorInfo];

    /// Runs one request and returns all outputs in model order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Inference`](crate::Error::Inference) if the runtime
    /// rejects the request.
    fn infer(&mut self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_files_from_base() {
        let files = ModelFiles::from_base("/models/landmarks-regression-retail-0009");
        assert_eq!(
            files.topology,
            PathBuf::from("/models/landmarks-regression-retail-0009.onnx")
        );
        assert_eq!(
            files.weights,
            PathBuf::from("/models/landmarks-regression-retail-0009.onnx.data")
        );
        assert!(!files.exists());
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("CPU".parse::<Device>(), Ok(Device::Cpu));
        assert_eq!("cpu".parse::<Device>(), Ok(Device::Cpu));
        assert_eq!("".parse::<Device>(), Ok(Device::Cpu));
        assert_eq!(
            "gpu".parse::<Device>(),
            Ok(Device::Accelerator("GPU".into()))
        );
        assert_eq!(Device::Accelerator("MYRIAD".into()).to_string(), "MYRIAD");
    }

    #[test]
    fn test_nchw_spatial() {
        let info = TensorInfo::fixed("0", &[1, 3, 48, 48]);
        assert_eq!(info.nchw_spatial(), Some((48, 48)));

        let dynamic = TensorInfo {
            name: "0".into(),
            shape: vec![None, Some(3), None, None],
        };
        assert_eq!(dynamic.nchw_spatial(), None);

        let flat = TensorInfo::fixed("head_pose_angles", &[1, 3]);
        assert_eq!(flat.nchw_spatial(), None);
    }
}
