//! Adapter implementations for port traits.
//!
//! - `live/`: HTTP implementations against the prediction proxy
//! - `recording/`: record backend interactions to cassettes
//! - `replaying/`: replay backend interactions from cassettes

pub mod live;
pub mod recording;
pub mod replaying;
