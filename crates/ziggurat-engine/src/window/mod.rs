//! The window and its event loop.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
