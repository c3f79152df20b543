//! Audio loading module
//!
//! Provides in-memory audio buffering and chunk-reference production.
//! Capture from microphones/loopback devices, demuxing and resampling are
//! external collaborators (see `AudioSource`); this module only holds
//! already-decoded PCM.

pub mod store;
pub mod types;

pub use store::AudioStore;
pub use types::*;