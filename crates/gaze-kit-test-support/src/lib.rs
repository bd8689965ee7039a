//! Test support utilities for gaze-kit.
//!
//! Provides a scripted inference engine, synthetic frame builders, and a
//! tracing setup for tests.
//!
//! # Example
//!
//! ```
//! use gaze_kit_core::{LandmarkConfig, LandmarkDetector};
//! use gaze_kit_test_support::{MockModel, SyntheticFrameBuilder};
//!
//! let points = [(0.3, 0.4), (0.7, 0.4), (0.5, 0.6), (0.35, 0.8), (0.65, 0.8)];
//! let model = MockModel::landmarks(points);
//! let mut detector = LandmarkDetector::new(Box::new(model), LandmarkConfig::default()).unwrap();
//!
//! let face = SyntheticFrameBuilder::gradient(80, 80);
//! let mut frame = SyntheticFrameBuilder::solid(320, 240, [255, 255, 255]);
//! let prediction = detector
//!     .predict(&face, gaze_kit_core::BoxOffset::new(100, 50), &mut frame)
//!     .unwrap();
//! assert_eq!(prediction.eye_centers.left.x, 124);
//! ```

mod builders;
mod mocks;

pub use builders::SyntheticFrameBuilder;
pub use mocks::{LoadCall, MockInferenceEngine, MockModel};

/// Installs a test-writer tracing subscriber once per process.
///
/// Honors `RUST_LOG`; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
