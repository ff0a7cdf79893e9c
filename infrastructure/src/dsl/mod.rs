//! Phase script loading

mod loader;

pub use loader::{DslLoadError, DslLoader};
