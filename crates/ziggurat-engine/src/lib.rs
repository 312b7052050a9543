//! Ziggurat engine crate.
//!
//! The platform floor for the workspace: window + event loop, GPU device
//! and surface management, the post-render task queue, input translation,
//! frame timing and logger setup. Higher layers (the overlay bridge and
//! applications) build on these pieces without touching winit or the
//! swapchain directly.

pub mod device;
pub mod window;
pub mod input;
pub mod time;
pub mod core;

pub mod logging;
pub mod color;
