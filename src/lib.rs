//! Imagen playground: configure a hosted image model, submit a prediction to
//! the proxy, poll it to completion, and preview or download the result.

pub mod adapters;
pub mod aspect;
pub mod cassette;
pub mod config;
pub mod context;
pub mod error;
pub mod forms;
pub mod lifecycle;
pub mod media;
pub mod model;
pub mod normalize;
pub mod output;
pub mod params;
pub mod playground;
pub mod ports;
pub mod preview;
pub mod state;

pub use error::PlaygroundError;
pub use model::ModelKey;
pub use playground::Playground;
