//! Gaze Kit Adapters - External adapters for gaze-kit.
//!
//! This crate provides adapters for:
//! - ONNX Runtime model execution (the [`OrtEngine`] inference engine)
//! - Layered TOML configuration
//! - Model registry and file locations
//! - Frame and font loading
//! - Logging setup

pub mod config;
pub mod fs;
pub mod logging;
pub mod models;
mod ort_engine;

pub use config::AppConfig;
pub use fs::{load_font, load_frame, save_frame};
pub use models::{model_files, models_dir};
pub use ort_engine::{OrtEngine, OrtModel};
