//! Schema module - Configuration, arena and data-contract types.

mod arena;
mod config;
mod evolution;
mod snapshot;

pub use arena::*;
pub use config::*;
pub use evolution::*;
pub use snapshot::*;
