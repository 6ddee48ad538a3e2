//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the playground core and an
//! external system. Implementations live in `src/adapters/`.

pub mod image_probe;
pub mod prediction_backend;

pub use image_probe::{ImageDimensions, ImageProbe};
pub use prediction_backend::{
    BackendFuture, GenerationRequest, Job, JobStatus, PredictionBackend,
};
