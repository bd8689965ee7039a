//! Integration tests for model loading through the ONNX Runtime engine.

#![allow(clippy::unwrap_used)]

use std::fs;

use gaze_kit_adapters::{model_files, OrtEngine};
use gaze_kit_core::ports::{Device, InferenceEngine};
use gaze_kit_core::{Error, GazeConfig, GazeEstimator, LandmarkConfig, LandmarkDetector};

#[test]
fn test_uninstalled_models_fail_with_load_error() {
    let models = tempfile::tempdir().unwrap();
    let engine = OrtEngine::new();

    let landmarks = model_files(models.path(), "landmarks").unwrap();
    let err = LandmarkDetector::load(&engine, &landmarks, &Device::Cpu, LandmarkConfig::default())
        .unwrap_err();
    assert!(matches!(err, Error::ModelLoad { ref path, .. } if *path == landmarks.topology));

    let gaze = model_files(models.path(), "gaze").unwrap();
    let err = GazeEstimator::load(&engine, &gaze, &Device::Cpu, GazeConfig::default()).unwrap_err();
    assert!(matches!(err, Error::ModelLoad { .. }));
}

#[test]
fn test_corrupt_topology_is_a_load_error() {
    let models = tempfile::tempdir().unwrap();
    let files = model_files(models.path(), "gaze").unwrap();
    fs::write(&files.topology, b"this is not a protobuf").unwrap();

    let err = OrtEngine::new().load(&files, &Device::Cpu).err();

    assert!(matches!(err, Some(Error::ModelLoad { .. })));
}
