//! Ziggurat overlay crate: the debug-overlay draw-data bridge.
//!
//! Higher layers produce per-frame [`draw::DrawData`] (vertex/index lists
//! with clipped, textured commands); the [`renderer::OverlayRenderer`]
//! consumes it and schedules the GPU work on the device context's
//! post-render queue.
//!
//! The bridge owns its GPU resources (two shader programs, the font atlas,
//! samplers and uniforms) behind an explicit init/shutdown lifecycle and
//! treats them as read-only while a frame renders.

pub mod atlas;
pub mod draw;
pub mod plan;
pub mod renderer;
pub mod texture;

pub use atlas::{AtlasError, FontAtlas, FontKind, GlyphInfo, LineMetrics};
pub use draw::{DrawCmd, DrawCmdParams, DrawData, DrawIdx, DrawList, DrawVert};
pub use renderer::{OverlayConfig, OverlayRenderer};
pub use texture::{TextureId, TextureRef, TextureSlot};
