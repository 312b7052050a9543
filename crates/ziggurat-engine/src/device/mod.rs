//! GPU device, surface and per-frame GPU plumbing.
//!
//! [`Gpu`] owns the wgpu device/queue and the swapchain. [`DeviceContext`]
//! is the handle renderers bind to: it carries device/queue clones, the
//! transient geometry pool and the post-render task queue that deferred
//! draw work is scheduled on.

mod context;
mod gpu;
mod transient;

pub use context::{DeviceContext, PostRenderCtx, PostRenderTask};
pub use gpu::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
pub use transient::{TransientBuffers, TransientConfig, TransientRange};
