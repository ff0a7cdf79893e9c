//! Model registry adapters

mod configured;

pub use configured::ConfiguredModelRegistry;
