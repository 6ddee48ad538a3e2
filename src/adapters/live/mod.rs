//! Live adapters that talk to the prediction proxy over HTTP.

pub mod http_backend;
pub mod image_probe;

pub use http_backend::HttpPredictionBackend;
pub use image_probe::HttpImageProbe;
