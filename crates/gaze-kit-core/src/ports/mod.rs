//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundary between the postprocessing core and the
//! inference runtime adapter.

mod inference;

pub use inference::{
    CompiledModel, Device, InferenceEngine, ModelFiles, NamedTensor, TensorInfo,
    TOPOLOGY_EXTENSION, WEIGHTS_EXTENSION,
};
