//! ONNX Runtime adapter for the inference port.
//!
//! Execution providers are probed once when the engine is built. Devices the
//! engine cannot serve fall back to CPU with a warning.

use std::io;
use std::path::Path;

use gaze_kit_core::ports::{
    CompiledModel, Device, InferenceEngine, ModelFiles, NamedTensor, TensorInfo,
};
use gaze_kit_core::{Error, Result};
use ndarray::{ArrayD, IxDyn};
use ort::execution_providers::{CPUExecutionProvider, ExecutionProviderDispatch};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, ValueType};
use tracing::{debug, info, warn};

/// Prefix of the ORT error raised when no kernel exists for a node.
const MISSING_KERNEL: &str = "Could not find an implementation for";
/// Marker preceding the node name in that error.
const NODE_NAME_MARKER: &str = "node with name '";

/// Accelerator backend found at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accelerator {
    Unavailable,
    #[cfg(feature = "openvino")]
    OpenVino,
}

/// Inference engine backed by ONNX Runtime.
#[derive(Debug, Clone)]
pub struct OrtEngine {
    accelerator: Accelerator,
    intra_threads: Option<usize>,
}

impl Default for OrtEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OrtEngine {
    /// Creates an engine and probes the available execution providers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            accelerator: probe_accelerator(),
            intra_threads: None,
        }
    }

    /// Limits the number of threads used inside a single operator.
    #[must_use]
    pub const fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = Some(threads);
        self
    }

    /// Returns true if accelerator devices run on an accelerator backend.
    #[must_use]
    pub fn has_accelerator(&self) -> bool {
        self.accelerator != Accelerator::Unavailable
    }

    /// Device a model requested for `device` actually runs on.
    #[must_use]
    pub fn resolve_device(&self, device: &Device) -> Device {
        match (device, self.accelerator) {
            (Device::Cpu, _) => Device::Cpu,
            (Device::Accelerator(name), Accelerator::Unavailable) => {
                warn!("No execution provider for device {name}, falling back to CPU");
                Device::Cpu
            }
            #[cfg(feature = "openvino")]
            (Device::Accelerator(_), Accelerator::OpenVino) => device.clone(),
        }
    }

    fn execution_providers(resolved: &Device) -> Vec<ExecutionProviderDispatch> {
        match resolved {
            Device::Cpu => vec![CPUExecutionProvider::default().build()],
            #[cfg(feature = "openvino")]
            Device::Accelerator(name) => {
                use ort::execution_providers::OpenVINOExecutionProvider;
                vec![
                    OpenVINOExecutionProvider::default()
                        .with_device_type(name.clone())
                        .build()
                        .error_on_failure(),
                    CPUExecutionProvider::default().build(),
                ]
            }
            #[cfg(not(feature = "openvino"))]
            Device::Accelerator(_) => vec![CPUExecutionProvider::default().build()],
        }
    }

    fn build_session(
        &self,
        topology: &Path,
        providers: Vec<ExecutionProviderDispatch>,
    ) -> ort::Result<Session> {
        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_execution_providers(providers)?;
        if let Some(threads) = self.intra_threads {
            builder = builder.with_intra_threads(threads)?;
        }
        builder.commit_from_file(topology)
    }
}

impl InferenceEngine for OrtEngine {
    fn load(&self, files: &ModelFiles, device: &Device) -> Result<Box<dyn CompiledModel>> {
        if !files.exists() {
            return Err(Error::model_load(
                &files.topology,
                io::Error::new(io::ErrorKind::NotFound, "topology file not found"),
            ));
        }

        if files.weights.is_file() {
            debug!("Weights sidecar: {}", files.weights.display());
        } else {
            debug!(
                "No weights sidecar next to {}, expecting embedded weights",
                files.topology.display()
            );
        }

        let resolved = self.resolve_device(device);
        let providers = Self::execution_providers(&resolved);
        let session = self
            .build_session(&files.topology, providers)
            .map_err(|e| load_error(&e.to_string(), &files.topology, &resolved))?;

        let model = OrtModel::new(session);
        info!(
            "Compiled {} for {} ({} inputs, {} outputs)",
            files.topology.display(),
            resolved,
            model.inputs.len(),
            model.outputs.len()
        );

        Ok(Box::new(model))
    }
}

/// A compiled ONNX Runtime session.
pub struct OrtModel {
    session: Session,
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
}

impl std::fmt::Debug for OrtModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtModel")
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

impl OrtModel {
    /// Wraps a session and reads its declared inputs and outputs.
    #[must_use]
    pub fn new(session: Session) -> Self {
        let inputs = session
            .inputs
            .iter()
            .map(|input| tensor_info(&input.name, &input.input_type))
            .collect();
        let outputs = session
            .outputs
            .iter()
            .map(|output| tensor_info(&output.name, &output.output_type))
            .collect();

        Self {
            session,
            inputs,
            outputs,
        }
    }
}

impl CompiledModel for OrtModel {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    fn infer(&mut self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        let mut values = Vec::with_capacity(inputs.len());
        for tensor in inputs {
            let value = Tensor::from_array(tensor.data).map_err(|e| {
                Error::Inference(format!("could not build tensor '{}': {e}", tensor.name))
            })?;
            values.push((tensor.name, value.into_dyn()));
        }

        let outputs = self
            .session
            .run(values)
            .map_err(|e| Error::Inference(e.to_string()))?;

        let mut named = Vec::with_capacity(outputs.len());
        for (name, value) in outputs.iter() {
            let (shape, data) = value.try_extract_tensor::<f32>().map_err(|e| {
                Error::InvalidOutput(format!("output '{name}' is not an f32 tensor: {e}"))
            })?;
            let dims: Vec<usize> = shape
                .iter()
                .map(|&d| usize::try_from(d).unwrap_or(0))
                .collect();
            let array = ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec()).map_err(|e| {
                Error::InvalidOutput(format!("output '{name}' has inconsistent shape: {e}"))
            })?;
            named.push(NamedTensor::new(name, array));
        }

        Ok(named)
    }
}

#[cfg(feature = "openvino")]
fn probe_accelerator() -> Accelerator {
    use ort::execution_providers::{ExecutionProvider, OpenVINOExecutionProvider};

    match OpenVINOExecutionProvider::default().is_available() {
        Ok(true) => {
            info!("OpenVINO execution provider available");
            Accelerator::OpenVino
        }
        Ok(false) => {
            warn!("OpenVINO execution provider not available, accelerator devices will run on CPU");
            Accelerator::Unavailable
        }
        Err(e) => {
            warn!("Could not query OpenVINO execution provider: {e}");
            Accelerator::Unavailable
        }
    }
}

#[cfg(not(feature = "openvino"))]
fn probe_accelerator() -> Accelerator {
    debug!("Built without accelerator support, all devices run on CPU");
    Accelerator::Unavailable
}

fn tensor_info(name: &str, value_type: &ValueType) -> TensorInfo {
    let shape = match value_type {
        ValueType::Tensor { shape, .. } => shape.iter().map(|&d| usize::try_from(d).ok()).collect(),
        _ => Vec::new(),
    };

    TensorInfo {
        name: name.to_owned(),
        shape,
    }
}

/// Maps a session build failure to the port's error taxonomy.
fn load_error(message: &str, topology: &Path, device: &Device) -> Error {
    let layers = unsupported_layers(message);
    if layers.is_empty() {
        Error::model_load(topology, message.to_owned())
    } else {
        Error::UnsupportedLayers {
            device: device.to_string(),
            layers,
        }
    }
}

/// Extracts node names from ORT "missing kernel" errors.
fn unsupported_layers(message: &str) -> Vec<String> {
    if !message.contains(MISSING_KERNEL) {
        return Vec::new();
    }

    let mut layers: Vec<String> = Vec::new();
    let mut rest = message;
    while let Some(start) = rest.find(NODE_NAME_MARKER) {
        let after = &rest[start + NODE_NAME_MARKER.len()..];
        let Some(end) = after.find('\'') else {
            break;
        };
        let name = &after[..end];
        if !layers.iter().any(|layer| layer == name) {
            layers.push(name.to_owned());
        }
        rest = &after[end..];
    }

    layers
}
