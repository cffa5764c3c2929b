//! Virtual filesystem bridge between callers and the engine namespace.

mod bridge;
mod error;

pub use bridge::FsBridge;
pub use error::FsError;
