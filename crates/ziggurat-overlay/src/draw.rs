//! Draw-data boundary types.
//!
//! These are the wire contract between overlay producers (the UI layer
//! building panels and text) and the bridge renderer. Producers own the
//! buffers; the bridge snapshots them by value when scheduling GPU work.

use bytemuck::{Pod, Zeroable};

use crate::texture::TextureId;

/// Index element type used by draw lists.
pub type DrawIdx = u16;

/// Single UI vertex: 2D position, 2D texture coordinate, RGBA color as
/// normalized u8.
///
/// Positions and texture coordinates are in the producer's display space;
/// the projection uniform maps them to clip space.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct DrawVert {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [u8; 4],
}

impl DrawVert {
    /// Byte stride of one vertex in the transient buffer.
    pub const STRIDE: u64 = std::mem::size_of::<DrawVert>() as u64;
}

/// Parameters common to every draw command.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCmdParams {
    /// Clip rectangle as `(min_x, min_y, max_x, max_y)` in display
    /// coordinates (pre framebuffer scale).
    pub clip_rect: [f32; 4],

    /// Packed texture id; [`TextureId::NONE`] selects the font atlas with
    /// alpha blending forced on.
    pub texture: TextureId,

    /// First index of this command within the owning list's index buffer.
    pub idx_offset: u32,

    /// Base vertex added to every index of this command.
    pub vtx_offset: u32,
}

impl Default for DrawCmdParams {
    fn default() -> Self {
        Self {
            clip_rect: [0.0, 0.0, 0.0, 0.0],
            texture: TextureId::NONE,
            idx_offset: 0,
            vtx_offset: 0,
        }
    }
}

/// User callback carried by a draw command.
///
/// Invoked on the render path in command order; produces no GPU submission
/// of its own.
pub type DrawCallback = fn(&DrawList, &DrawCmdParams);

/// One entry of a draw list's command stream.
#[derive(Debug, Clone)]
pub enum DrawCmd {
    /// Indexed, scissored draw of `count` elements.
    Elements { count: u32, params: DrawCmdParams },

    /// User hook; skipped by GPU submission.
    Callback {
        callback: DrawCallback,
        params: DrawCmdParams,
    },
}

impl DrawCmd {
    pub fn params(&self) -> &DrawCmdParams {
        match self {
            DrawCmd::Elements { params, .. } => params,
            DrawCmd::Callback { params, .. } => params,
        }
    }
}

/// One independently-clipped geometry stream.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    pub vertices: Vec<DrawVert>,
    pub indices: Vec<DrawIdx>,
    pub commands: Vec<DrawCmd>,
}

impl DrawList {
    /// Bytes of vertex data this list would occupy in the transient pool.
    pub fn vertex_bytes(&self) -> u64 {
        self.vertices.len() as u64 * DrawVert::STRIDE
    }

    /// Bytes of index data this list would occupy in the transient pool.
    pub fn index_bytes(&self) -> u64 {
        self.indices.len() as u64 * std::mem::size_of::<DrawIdx>() as u64
    }

    /// Checks the buffer-range invariant for every command: index ranges and
    /// base vertices must stay within this list's buffers.
    pub fn validate(&self) -> bool {
        self.commands.iter().all(|cmd| match cmd {
            DrawCmd::Elements { count, params } => {
                let end = params.idx_offset as usize + *count as usize;
                let idx_ok = end <= self.indices.len();
                let vtx_ok =
                    *count == 0 || (params.vtx_offset as usize) < self.vertices.len();
                idx_ok && vtx_ok
            }
            DrawCmd::Callback { .. } => true,
        })
    }
}

/// Everything the bridge needs to render one frame of overlay UI.
#[derive(Debug, Clone, Default)]
pub struct DrawData {
    /// Top-left of the display area in UI coordinates.
    pub display_pos: [f32; 2],

    /// Size of the display area in UI coordinates.
    pub display_size: [f32; 2],

    /// UI-coordinate to framebuffer-pixel scale.
    pub framebuffer_scale: [f32; 2],

    /// Draw lists in back-to-front order.
    pub lists: Vec<DrawList>,
}

impl DrawData {
    /// Framebuffer extent in pixels: display size scaled by the framebuffer
    /// scale. A non-positive extent means there is nothing to render (e.g.
    /// minimized window).
    pub fn framebuffer_size(&self) -> (f32, f32) {
        (
            self.display_size[0] * self.framebuffer_scale[0],
            self.display_size[1] * self.framebuffer_scale[1],
        )
    }

    /// Total vertices across all lists.
    pub fn total_vtx_count(&self) -> usize {
        self.lists.iter().map(|l| l.vertices.len()).sum()
    }

    /// Total indices across all lists.
    pub fn total_idx_count(&self) -> usize {
        self.lists.iter().map(|l| l.indices.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_list() -> DrawList {
        DrawList {
            vertices: vec![DrawVert::default(); 4],
            indices: vec![0, 1, 2, 0, 2, 3],
            commands: vec![DrawCmd::Elements {
                count: 6,
                params: DrawCmdParams {
                    clip_rect: [0.0, 0.0, 10.0, 10.0],
                    ..DrawCmdParams::default()
                },
            }],
        }
    }

    // ── validation ────────────────────────────────────────────────────────

    #[test]
    fn valid_list_passes() {
        assert!(quad_list().validate());
    }

    #[test]
    fn index_range_overrun_fails() {
        let mut list = quad_list();
        list.commands[0] = DrawCmd::Elements {
            count: 7,
            params: DrawCmdParams::default(),
        };
        assert!(!list.validate());
    }

    #[test]
    fn base_vertex_out_of_range_fails() {
        let mut list = quad_list();
        list.commands[0] = DrawCmd::Elements {
            count: 6,
            params: DrawCmdParams {
                vtx_offset: 4,
                ..DrawCmdParams::default()
            },
        };
        assert!(!list.validate());
    }

    #[test]
    fn empty_command_ignores_base_vertex() {
        let mut list = quad_list();
        list.commands[0] = DrawCmd::Elements {
            count: 0,
            params: DrawCmdParams {
                vtx_offset: 99,
                ..DrawCmdParams::default()
            },
        };
        assert!(list.validate());
    }

    // ── sizes ─────────────────────────────────────────────────────────────

    #[test]
    fn byte_sizes_follow_counts() {
        let list = quad_list();
        assert_eq!(list.vertex_bytes(), 4 * DrawVert::STRIDE);
        assert_eq!(list.index_bytes(), 6 * 2);
    }

    #[test]
    fn vertex_stride_is_packed() {
        // 2 f32 position + 2 f32 uv + 4 u8 color.
        assert_eq!(DrawVert::STRIDE, 20);
    }

    #[test]
    fn framebuffer_size_applies_scale() {
        let data = DrawData {
            display_pos: [0.0, 0.0],
            display_size: [800.0, 600.0],
            framebuffer_scale: [2.0, 2.0],
            lists: vec![],
        };
        assert_eq!(data.framebuffer_size(), (1600.0, 1200.0));
    }

    #[test]
    fn totals_sum_across_lists() {
        let data = DrawData {
            display_pos: [0.0, 0.0],
            display_size: [100.0, 100.0],
            framebuffer_scale: [1.0, 1.0],
            lists: vec![quad_list(), quad_list()],
        };
        assert_eq!(data.total_vtx_count(), 8);
        assert_eq!(data.total_idx_count(), 12);
    }
}
