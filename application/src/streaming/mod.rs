//! Response streaming engine
//!
//! Decoding, write throttling, in-flight tracking and the per-message
//! state machine that ties them together.

pub mod clock;
pub mod controller;
pub mod decoder;
pub mod streaming_set;
pub mod throttle;
