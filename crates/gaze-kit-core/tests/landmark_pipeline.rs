//! Landmark detector integration tests against the mock inference engine.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

use gaze_kit_core::ports::NamedTensor;
use gaze_kit_core::{
    BoxOffset, Device, Error, LandmarkConfig, LandmarkDetector, ModelFiles, OverlayStyle, Point,
};
use gaze_kit_test_support::{init_tracing, MockInferenceEngine, MockModel, SyntheticFrameBuilder};
use ndarray::ArrayD;

const WHITE: [u8; 3] = [255, 255, 255];
const SCENARIO: [(f32, f32); 5] = [(0.5, 0.5), (0.2, 0.5), (0.5, 0.6), (0.3, 0.8), (0.7, 0.8)];

fn detector(model: MockModel) -> LandmarkDetector {
    LandmarkDetector::new(Box::new(model), LandmarkConfig::default()).unwrap()
}

#[test]
fn test_face_scenario_end_to_end() {
    init_tracing();
    let model = MockModel::landmarks(SCENARIO);
    let recorder = model.clone();
    let mut detector = detector(model);

    let face = SyntheticFrameBuilder::gradient(200, 200);
    let mut frame = SyntheticFrameBuilder::solid(320, 320, WHITE);

    let prediction = detector
        .predict(&face, BoxOffset::new(50, 60), &mut frame)
        .unwrap();

    assert_eq!(
        prediction.landmarks.points(),
        &[
            Point::new(150, 160),
            Point::new(90, 160),
            Point::new(150, 180),
            Point::new(110, 220),
            Point::new(190, 220),
        ]
    );
    assert_eq!(prediction.eye_centers.to_array(), [150, 160, 90, 160]);
    assert_eq!(prediction.eye_crops.left.dimensions(), (50, 50));
    assert_eq!(prediction.eye_crops.right.dimensions(), (50, 50));

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0][0].name, "0");
    assert_eq!(calls[0][0].data.shape(), &[1, 3, 48, 48]);
}

#[test]
fn test_frame_is_annotated_in_place() {
    let mut detector = detector(MockModel::landmarks(SCENARIO));
    let face = SyntheticFrameBuilder::solid(200, 200, [40, 40, 40]);
    let mut frame = SyntheticFrameBuilder::solid(320, 320, WHITE);
    let blue = OverlayStyle::default().landmark_color;

    detector
        .predict(&face, BoxOffset::new(50, 60), &mut frame)
        .unwrap();

    // Eye box corners (center +/- 25) and the nose marker.
    assert_eq!(*frame.get_pixel(125, 135), blue);
    assert_eq!(*frame.get_pixel(175, 185), blue);
    assert_eq!(*frame.get_pixel(65, 135), blue);
    assert_eq!(*frame.get_pixel(150, 180), blue);
    assert_eq!(*frame.get_pixel(110, 220), blue);
    // Box interiors stay clean.
    assert_eq!(frame.get_pixel(150, 160).0, WHITE);
}

#[test]
fn test_eye_crops_do_not_see_annotations() {
    let mut detector = detector(MockModel::landmarks(SCENARIO));
    let face = SyntheticFrameBuilder::solid(200, 200, [40, 40, 40]);
    let mut frame = SyntheticFrameBuilder::solid(320, 320, WHITE);

    let prediction = detector
        .predict(&face, BoxOffset::new(50, 60), &mut frame)
        .unwrap();

    assert!(prediction.eye_crops.left.pixels().all(|p| p.0 == WHITE));
    assert!(prediction.eye_crops.right.pixels().all(|p| p.0 == WHITE));
}

#[test]
fn test_predict_on_copy_leaves_original_untouched() {
    let mut detector = detector(MockModel::landmarks(SCENARIO));
    let face = SyntheticFrameBuilder::checkerboard(200, 200);
    let original = SyntheticFrameBuilder::solid(320, 320, WHITE);
    let mut annotated = original.clone();

    detector
        .predict(&face, BoxOffset::new(50, 60), &mut annotated)
        .unwrap();

    assert!(original.pixels().all(|p| p.0 == WHITE));
    assert_ne!(annotated, original);
}

#[test]
fn test_eye_near_corner_is_clamped() {
    let points = [(0.1, 0.1), (0.9, 0.95), (0.5, 0.5), (0.3, 0.8), (0.7, 0.8)];
    let mut detector = detector(MockModel::landmarks(points));
    let face = SyntheticFrameBuilder::solid(100, 100, [10, 10, 10]);
    let mut frame = SyntheticFrameBuilder::gradient(100, 100);

    let prediction = detector
        .predict(&face, BoxOffset::default(), &mut frame)
        .unwrap();

    assert_eq!(prediction.eye_centers.left, Point::new(10, 10));
    assert_eq!(prediction.eye_crops.left.dimensions(), (35, 35));
    assert_eq!(prediction.eye_centers.right, Point::new(90, 95));
    assert_eq!(prediction.eye_crops.right.dimensions(), (35, 30));
}

#[test]
fn test_custom_half_size() {
    let config = LandmarkConfig::default().with_eye_half_size(10);
    let mut detector =
        LandmarkDetector::new(Box::new(MockModel::landmarks(SCENARIO)), config).unwrap();
    let face = SyntheticFrameBuilder::solid(200, 200, [0, 0, 0]);
    let mut frame = SyntheticFrameBuilder::solid(320, 320, WHITE);

    let prediction = detector
        .predict(&face, BoxOffset::new(50, 60), &mut frame)
        .unwrap();

    assert_eq!(prediction.eye_crops.left.dimensions(), (20, 20));
}

#[test]
fn test_huge_half_size_does_not_overflow() {
    let config = LandmarkConfig::default().with_eye_half_size(2_147_483_648);
    let mut detector =
        LandmarkDetector::new(Box::new(MockModel::landmarks(SCENARIO)), config).unwrap();
    let face = SyntheticFrameBuilder::solid(200, 200, [0, 0, 0]);
    let mut frame = SyntheticFrameBuilder::solid(320, 320, WHITE);

    let prediction = detector
        .predict(&face, BoxOffset::new(50, 60), &mut frame)
        .unwrap();

    // Both windows cover the whole frame; the boxes fall outside it.
    assert_eq!(prediction.eye_crops.left.dimensions(), (320, 320));
    assert_eq!(prediction.eye_crops.right.dimensions(), (320, 320));
    assert_eq!(frame.get_pixel(0, 0).0, WHITE);
    assert_eq!(frame.get_pixel(319, 319).0, WHITE);
}

#[test]
fn test_inference_failure_leaves_frame_untouched() {
    let mut detector = detector(MockModel::landmarks(SCENARIO).failing("request timed out"));
    let face = SyntheticFrameBuilder::solid(200, 200, [0, 0, 0]);
    let mut frame = SyntheticFrameBuilder::solid(320, 320, WHITE);
    let before = frame.clone();

    let err = detector
        .predict(&face, BoxOffset::new(50, 60), &mut frame)
        .unwrap_err();

    assert!(matches!(err, Error::Inference(_)));
    assert_eq!(frame, before);
}

#[test]
fn test_short_output_is_rejected_before_drawing() {
    let model = MockModel::landmarks(SCENARIO).with_response(vec![NamedTensor::new(
        "95",
        ArrayD::from_elem(vec![1, 4], 0.5),
    )]);
    let mut detector = detector(model);
    let face = SyntheticFrameBuilder::solid(200, 200, [0, 0, 0]);
    let mut frame = SyntheticFrameBuilder::solid(320, 320, WHITE);
    let before = frame.clone();

    let err = detector
        .predict(&face, BoxOffset::new(50, 60), &mut frame)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidOutput(_)));
    assert_eq!(frame, before);
}

#[test]
fn test_empty_face_is_rejected() {
    let model = MockModel::landmarks(SCENARIO);
    let recorder = model.clone();
    let mut detector = detector(model);
    let face = SyntheticFrameBuilder::solid(0, 0, WHITE);
    let mut frame = SyntheticFrameBuilder::solid(64, 64, WHITE);

    let err = detector
        .predict(&face, BoxOffset::default(), &mut frame)
        .unwrap_err();

    assert!(matches!(err, Error::InvalidInput(_)));
    assert_eq!(recorder.call_count(), 0);
}

#[test]
fn test_load_through_engine() {
    let files = ModelFiles::from_base("/models/landmarks-regression-retail-0009");
    let engine = MockInferenceEngine::new().with_model(&files, MockModel::landmarks(SCENARIO));

    let detector =
        LandmarkDetector::load(&engine, &files, &Device::Cpu, LandmarkConfig::default()).unwrap();

    assert_eq!(detector.input_size(), (48, 48));
    assert_eq!(engine.loads()[0].topology, files.topology);
}

#[test]
fn test_unsupported_layers_are_reported() {
    let files = ModelFiles::from_base("/models/landmarks-regression-retail-0009");
    let device = Device::Accelerator("MYRIAD".into());
    let engine = MockInferenceEngine::new()
        .with_model(&files, MockModel::landmarks(SCENARIO))
        .with_unsupported_layers(device.clone(), &["conv_3", "prelu_3"]);

    let err =
        LandmarkDetector::load(&engine, &files, &device, LandmarkConfig::default()).unwrap_err();

    assert_eq!(
        err.unsupported_layers(),
        Some(&["conv_3".to_string(), "prelu_3".to_string()][..])
    );
    assert!(err.to_string().contains("MYRIAD"));
}

#[test]
fn test_missing_model_is_a_load_error() {
    let engine = MockInferenceEngine::new();
    let files = ModelFiles::from_base("/nowhere/landmarks");

    let err = LandmarkDetector::load(&engine, &files, &Device::Cpu, LandmarkConfig::default())
        .unwrap_err();

    assert!(matches!(err, Error::ModelLoad { .. }));
}

#[test]
fn test_landmarks_serialize_to_json() {
    let mut detector = detector(MockModel::landmarks(SCENARIO));
    let face = SyntheticFrameBuilder::solid(200, 200, [0, 0, 0]);
    let mut frame = SyntheticFrameBuilder::solid(320, 320, WHITE);

    let prediction = detector
        .predict(&face, BoxOffset::new(50, 60), &mut frame)
        .unwrap();
    let json = serde_json::to_value(prediction.eye_centers).unwrap();

    assert_eq!(json["left"]["x"], 150);
    assert_eq!(json["right"]["y"], 160);
}
