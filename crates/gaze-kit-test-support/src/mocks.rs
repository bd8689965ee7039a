//! Mock implementations of the inference port.

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use gaze_kit_core::ports::{
    CompiledModel, Device, InferenceEngine, ModelFiles, NamedTensor, TensorInfo,
};
use gaze_kit_core::{Error, Result};
use ndarray::{arr2, Array4};

/// Mock implementation of `CompiledModel` for testing.
///
/// Returns scripted outputs and records every request. Clones share the
/// recorded requests, so keep a clone before boxing the model to inspect
/// calls afterwards.
#[derive(Clone)]
pub struct MockModel {
    inputs: Vec<TensorInfo>,
    outputs: Vec<TensorInfo>,
    response: Vec<NamedTensor>,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<Vec<NamedTensor>>>>,
}

impl MockModel {
    /// Creates a model with the given declared inputs and outputs that
    /// returns no tensors.
    #[must_use]
    pub fn new(inputs: Vec<TensorInfo>, outputs: Vec<TensorInfo>) -> Self {
        Self {
            inputs,
            outputs,
            response: Vec::new(),
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A landmark model with a 48x48 input returning the given normalized
    /// points as a `[1, 10, 1, 1]` output.
    #[must_use]
    pub fn landmarks(points: [(f32, f32); 5]) -> Self {
        let flat: Vec<f32> = points.iter().flat_map(|&(x, y)| [x, y]).collect();
        let data = Array4::from_shape_fn((1, 10, 1, 1), |(_, i, _, _)| flat[i]).into_dyn();

        Self::new(
            vec![TensorInfo::fixed("0", &[1, 3, 48, 48])],
            vec![TensorInfo::fixed("95", &[1, 10, 1, 1])],
        )
        .with_response(vec![NamedTensor::new("95", data)])
    }

    /// A gaze model returning the given vector on its `gaze_vector` output.
    #[must_use]
    pub fn gaze(vector: [f32; 3]) -> Self {
        Self::new(
            vec![
                TensorInfo::fixed("left_eye_image", &[1, 3, 60, 60]),
                TensorInfo::fixed("right_eye_image", &[1, 3, 60, 60]),
                TensorInfo::fixed("head_pose_angles", &[1, 3]),
            ],
            vec![TensorInfo::fixed("gaze_vector", &[1, 3])],
        )
        .with_response(vec![NamedTensor::new("gaze_vector", arr2(&[vector]).into_dyn())])
    }

    /// Sets the tensors returned by every request.
    #[must_use]
    pub fn with_response(mut self, response: Vec<NamedTensor>) -> Self {
        self.response = response;
        self
    }

    /// Makes every request fail with an inference error.
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns all recorded requests.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<NamedTensor>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of recorded requests.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl CompiledModel for MockModel {
    fn inputs(&self) -> &[TensorInfo] {
        &self.inputs
    }

    fn outputs(&self) -> &[TensorInfo] {
        &self.outputs
    }

    fn infer(&mut self, inputs: Vec<NamedTensor>) -> Result<Vec<NamedTensor>> {
        let unknown = inputs
            .iter()
            .find(|tensor| !self.inputs.iter().any(|info| info.name == tensor.name))
            .map(|tensor| tensor.name.clone());

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(inputs);

        if let Some(name) = unknown {
            return Err(Error::Inference(format!("unknown input '{name}'")));
        }
        if let Some(message) = &self.failure {
            return Err(Error::Inference(message.clone()));
        }
        Ok(self.response.clone())
    }
}

/// A recorded `InferenceEngine::load` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCall {
    /// Topology path that was requested.
    pub topology: PathBuf,
    /// Target device.
    pub device: Device,
}

/// Mock implementation of `InferenceEngine` for testing.
///
/// Serves registered models by topology path, rejects devices configured
/// with unsupported layers, and records every load.
#[derive(Default)]
pub struct MockInferenceEngine {
    models: Vec<(PathBuf, MockModel)>,
    unsupported: Vec<(Device, Vec<String>)>,
    loads: Arc<Mutex<Vec<LoadCall>>>,
}

impl MockInferenceEngine {
    /// Creates an engine with no models.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a model served for `files`.
    #[must_use]
    pub fn with_model(mut self, files: &ModelFiles, model: MockModel) -> Self {
        self.models.push((files.topology.clone(), model));
        self
    }

    /// Makes every load on `device` fail with the given unsupported layers.
    #[must_use]
    pub fn with_unsupported_layers(mut self, device: Device, layers: &[&str]) -> Self {
        self.unsupported
            .push((device, layers.iter().map(ToString::to_string).collect()));
        self
    }

    /// Returns all recorded loads.
    #[must_use]
    pub fn loads(&self) -> Vec<LoadCall> {
        self.loads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl InferenceEngine for MockInferenceEngine {
    fn load(&self, files: &ModelFiles, device: &Device) -> Result<Box<dyn CompiledModel>> {
        self.loads
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LoadCall {
                topology: files.topology.clone(),
                device: device.clone(),
            });

        let model = self
            .models
            .iter()
            .find(|(path, _)| *path == files.topology)
            .map(|(_, model)| model.clone())
            .ok_or_else(|| {
                Error::model_load(
                    &files.topology,
                    io::Error::new(io::ErrorKind::NotFound, "model not registered"),
                )
            })?;

        if let Some((_, layers)) = self.unsupported.iter().find(|(d, _)| d == device) {
            return Err(Error::UnsupportedLayers {
                device: device.to_string(),
                layers: layers.clone(),
            });
        }

        Ok(Box::new(model))
    }
}
