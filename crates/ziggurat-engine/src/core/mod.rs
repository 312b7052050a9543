//! The application-facing contract: the [`App`] trait the runtime drives
//! and the per-frame context it passes in.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, RenderTarget, WindowCtx};
