//! Frame planning.
//!
//! Pure translation of a [`DrawData`] snapshot into the uploads and draws a
//! render task will encode. No GPU handles are touched here, which keeps the
//! whole decision surface (skip rules, texture decoding, clip clamping,
//! capacity accounting) testable on the CPU.

use crate::draw::{DrawCmd, DrawData};
use crate::texture::{TextureRef, TextureSlot};

/// Depth range of the overlay's orthographic projection.
const DEPTH_NEAR: f32 = 0.0;
const DEPTH_FAR: f32 = 1000.0;

/// Which pipeline family a draw item uses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Program {
    /// Plain textured UI geometry.
    Ui,
    /// Image quads sampled at an explicit mip level.
    Image,
}

/// Scissor rectangle in framebuffer pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Scissor {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Scissor {
    /// Restricts the rectangle to an attachment of `w` x `h` pixels.
    /// Returns `None` when nothing remains visible.
    pub fn clamped_to(self, w: u32, h: u32) -> Option<Scissor> {
        if self.x >= w || self.y >= h {
            return None;
        }
        let width = self.width.min(w - self.x);
        let height = self.height.min(h - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Scissor { width, height, ..self })
    }
}

/// Transient-pool capacity available when planning starts.
#[derive(Debug, Copy, Clone)]
pub struct FrameLimits {
    pub vertex_bytes: u64,
    pub index_bytes: u64,
}

/// Buffer traffic for one surviving draw list.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ListUpload {
    /// Index into `DrawData::lists`.
    pub list: usize,
    pub vertex_bytes: u64,
    pub index_bytes: u64,
}

/// One scissored indexed draw.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawItem {
    pub list: usize,
    pub program: Program,
    pub alpha_blend: bool,
    pub slot: TextureSlot,
    /// Mip level for [`Program::Image`]; zero otherwise.
    pub lod: f32,
    pub scissor: Scissor,
    pub first_index: u32,
    pub index_count: u32,
    pub base_vertex: i32,
}

/// Ordered work of one frame.
#[derive(Debug, Clone)]
pub enum PlanItem {
    Draw(DrawItem),
    /// User callback; invoked in command order, submits nothing itself.
    Callback { list: usize, cmd: usize },
}

/// Everything the encoder needs, in submission order.
#[derive(Debug, Clone)]
pub struct FramePlan {
    pub projection: [[f32; 4]; 4],
    pub uploads: Vec<ListUpload>,
    pub items: Vec<PlanItem>,
    /// Lists dropped because the transient pool ran out.
    pub dropped_lists: usize,
    /// Lists dropped because a command referenced out-of-range geometry.
    pub invalid_lists: usize,
}

impl FramePlan {
    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.items.is_empty()
    }

    /// Image draws in this plan, i.e. how many LOD uniform slots the encoder
    /// must provision.
    pub fn image_draws(&self) -> usize {
        self.items
            .iter()
            .filter(|item| {
                matches!(item, PlanItem::Draw(d) if d.program == Program::Image)
            })
            .count()
    }
}

/// Plans one frame. Returns `None` when the framebuffer has no visible area
/// (minimized window).
pub fn plan_frame(data: &DrawData, limits: FrameLimits) -> Option<FramePlan> {
    let (fb_w, fb_h) = data.framebuffer_size();
    if fb_w as i32 <= 0 || fb_h as i32 <= 0 {
        return None;
    }

    let mut plan = FramePlan {
        projection: ortho_projection(data.display_pos, (fb_w, fb_h)),
        uploads: Vec::new(),
        items: Vec::new(),
        dropped_lists: 0,
        invalid_lists: 0,
    };

    let mut vertex_left = limits.vertex_bytes;
    let mut index_left = limits.index_bytes;

    for (list_idx, list) in data.lists.iter().enumerate() {
        if !list.validate() {
            plan.invalid_lists += 1;
            continue;
        }

        // Capacity is claimed per list, up front. A list that does not fit
        // aborts this and every later list so draw order never gets holes.
        let vb = aligned(list.vertex_bytes());
        let ib = aligned(list.index_bytes());
        if vb > vertex_left || ib > index_left {
            plan.dropped_lists = data.lists.len() - list_idx;
            break;
        }
        vertex_left -= vb;
        index_left -= ib;

        plan.uploads.push(ListUpload {
            list: list_idx,
            vertex_bytes: list.vertex_bytes(),
            index_bytes: list.index_bytes(),
        });

        for (cmd_idx, cmd) in list.commands.iter().enumerate() {
            match cmd {
                DrawCmd::Callback { .. } => {
                    plan.items.push(PlanItem::Callback {
                        list: list_idx,
                        cmd: cmd_idx,
                    });
                }
                DrawCmd::Elements { count: 0, .. } => {}
                DrawCmd::Elements { count, params } => {
                    let Some(scissor) = scissor_for_clip(
                        params.clip_rect,
                        data.display_pos,
                        data.framebuffer_scale,
                        (fb_w, fb_h),
                    ) else {
                        continue;
                    };

                    let tex = TextureRef::unpack(params.texture);
                    let program = if tex.mip_level != 0 {
                        Program::Image
                    } else {
                        Program::Ui
                    };

                    plan.items.push(PlanItem::Draw(DrawItem {
                        list: list_idx,
                        program,
                        alpha_blend: tex.alpha_blend,
                        slot: tex.slot,
                        lod: tex.mip_level as f32,
                        scissor,
                        first_index: params.idx_offset,
                        index_count: *count,
                        base_vertex: params.vtx_offset as i32,
                    }));
                }
            }
        }
    }

    Some(plan)
}

/// Orthographic projection over the display rectangle, depth 0..1000 mapped
/// to wgpu's 0..1 clip range. Column-major, ready for a WGSL `mat4x4<f32>`.
pub fn ortho_projection(display_pos: [f32; 2], fb_size: (f32, f32)) -> [[f32; 4]; 4] {
    let left = display_pos[0];
    let right = display_pos[0] + fb_size.0;
    let top = display_pos[1];
    let bottom = display_pos[1] + fb_size.1;

    let aa = 2.0 / (right - left);
    let bb = 2.0 / (top - bottom);
    let cc = 1.0 / (DEPTH_FAR - DEPTH_NEAR);
    let dd = (left + right) / (left - right);
    let ee = (top + bottom) / (bottom - top);
    let ff = DEPTH_NEAR / (DEPTH_NEAR - DEPTH_FAR);

    [
        [aa, 0.0, 0.0, 0.0],
        [0.0, bb, 0.0, 0.0],
        [0.0, 0.0, cc, 0.0],
        [dd, ee, ff, 1.0],
    ]
}

/// Maps a command's clip rectangle into a framebuffer scissor.
///
/// The clip is translated by the display origin and scaled to framebuffer
/// pixels. Rectangles entirely outside the framebuffer return `None`; the
/// visibility test deliberately runs before any clamping so a rectangle
/// hugging the right or bottom edge is treated as outside. Surviving
/// rectangles are clamped on all four sides (negative origins to zero, far
/// edges to the framebuffer). Degenerate results return `None`.
pub fn scissor_for_clip(
    clip_rect: [f32; 4],
    display_pos: [f32; 2],
    scale: [f32; 2],
    fb_size: (f32, f32),
) -> Option<Scissor> {
    let min_x = (clip_rect[0] - display_pos[0]) * scale[0];
    let min_y = (clip_rect[1] - display_pos[1]) * scale[1];
    let max_x = (clip_rect[2] - display_pos[0]) * scale[0];
    let max_y = (clip_rect[3] - display_pos[1]) * scale[1];

    let (fb_w, fb_h) = fb_size;
    if !(min_x < fb_w && min_y < fb_h && max_x >= 0.0 && max_y >= 0.0) {
        return None;
    }

    let x = min_x.max(0.0) as u32;
    let y = min_y.max(0.0) as u32;
    let width = (max_x.min(fb_w) - x as f32).max(0.0) as u32;
    let height = (max_y.min(fb_h) - y as f32).max(0.0) as u32;
    if width == 0 || height == 0 {
        return None;
    }

    Some(Scissor { x, y, width, height })
}

fn aligned(bytes: u64) -> u64 {
    bytes.next_multiple_of(wgpu::COPY_BUFFER_ALIGNMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::{DrawCmdParams, DrawList, DrawVert};
    use crate::texture::TextureId;

    const FB: (f32, f32) = (800.0, 600.0);
    const NO_OFFSET: [f32; 2] = [0.0, 0.0];
    const UNIT_SCALE: [f32; 2] = [1.0, 1.0];

    fn list_with_cmds(cmds: Vec<DrawCmd>) -> DrawList {
        let max_count = cmds
            .iter()
            .map(|c| match c {
                DrawCmd::Elements { count, params } => {
                    (params.idx_offset + count) as usize
                }
                DrawCmd::Callback { .. } => 0,
            })
            .max()
            .unwrap_or(0);
        DrawList {
            vertices: vec![DrawVert::default(); max_count.max(3)],
            indices: (0..max_count.max(3) as u16).collect(),
            commands: cmds,
        }
    }

    fn elements(count: u32, texture: TextureId, clip: [f32; 4]) -> DrawCmd {
        DrawCmd::Elements {
            count,
            params: DrawCmdParams {
                clip_rect: clip,
                texture,
                ..DrawCmdParams::default()
            },
        }
    }

    fn frame(lists: Vec<DrawList>) -> DrawData {
        DrawData {
            display_pos: [0.0, 0.0],
            display_size: [FB.0, FB.1],
            framebuffer_scale: [1.0, 1.0],
            lists,
        }
    }

    fn ample() -> FrameLimits {
        FrameLimits {
            vertex_bytes: 1 << 20,
            index_bytes: 1 << 20,
        }
    }

    fn draws(plan: &FramePlan) -> Vec<DrawItem> {
        plan.items
            .iter()
            .filter_map(|i| match i {
                PlanItem::Draw(d) => Some(*d),
                PlanItem::Callback { .. } => None,
            })
            .collect()
    }

    // ── frame-level skips ─────────────────────────────────────────────────

    #[test]
    fn minimized_framebuffer_plans_nothing() {
        let mut data = frame(vec![list_with_cmds(vec![elements(
            3,
            TextureId::NONE,
            [0.0, 0.0, 10.0, 10.0],
        )])]);
        data.display_size = [0.0, 600.0];
        assert!(plan_frame(&data, ample()).is_none());

        data.display_size = [800.0, -1.0];
        assert!(plan_frame(&data, ample()).is_none());
    }

    #[test]
    fn fractional_framebuffer_counts_as_empty() {
        let mut data = frame(vec![]);
        data.display_size = [0.75, 0.75];
        assert!(plan_frame(&data, ample()).is_none());
    }

    // ── texture decoding ──────────────────────────────────────────────────

    #[test]
    fn null_texture_selects_atlas_with_blending() {
        let data = frame(vec![list_with_cmds(vec![elements(
            3,
            TextureId::NONE,
            [0.0, 0.0, 100.0, 100.0],
        )])]);
        let plan = plan_frame(&data, ample()).expect("plan");
        let d = draws(&plan);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].program, Program::Ui);
        assert_eq!(d[0].slot, TextureSlot::ATLAS);
        assert!(d[0].alpha_blend);
        assert_eq!(d[0].lod, 0.0);
    }

    #[test]
    fn nonzero_mip_selects_image_program_with_lod() {
        let id = TextureRef {
            slot: TextureSlot(2),
            alpha_blend: false,
            mip_level: 3,
        }
        .pack();
        let data = frame(vec![list_with_cmds(vec![elements(
            3,
            id,
            [0.0, 0.0, 100.0, 100.0],
        )])]);
        let plan = plan_frame(&data, ample()).expect("plan");
        let d = draws(&plan);
        assert_eq!(d.len(), 1);
        assert_eq!(d[0].program, Program::Image);
        assert_eq!(d[0].slot, TextureSlot(2));
        assert!(!d[0].alpha_blend);
        assert_eq!(d[0].lod, 3.0);
        assert_eq!(plan.image_draws(), 1);
    }

    // ── command-level skips ───────────────────────────────────────────────

    #[test]
    fn zero_element_command_is_skipped() {
        let data = frame(vec![list_with_cmds(vec![
            elements(0, TextureId::NONE, [0.0, 0.0, 100.0, 100.0]),
            elements(3, TextureId::NONE, [0.0, 0.0, 100.0, 100.0]),
        ])]);
        let plan = plan_frame(&data, ample()).expect("plan");
        assert_eq!(draws(&plan).len(), 1);
        assert_eq!(plan.uploads.len(), 1);
    }

    #[test]
    fn offscreen_clip_skips_command() {
        let data = frame(vec![list_with_cmds(vec![
            elements(3, TextureId::NONE, [900.0, 0.0, 950.0, 50.0]),
            elements(3, TextureId::NONE, [-50.0, -50.0, -10.0, -10.0]),
        ])]);
        let plan = plan_frame(&data, ample()).expect("plan");
        assert!(draws(&plan).is_empty());
        // The list itself still claimed its upload.
        assert_eq!(plan.uploads.len(), 1);
    }

    #[test]
    fn callback_commands_pass_through_in_order() {
        fn hook(_: &DrawList, _: &DrawCmdParams) {}
        let data = frame(vec![list_with_cmds(vec![
            elements(3, TextureId::NONE, [0.0, 0.0, 100.0, 100.0]),
            DrawCmd::Callback {
                callback: hook,
                params: DrawCmdParams::default(),
            },
            elements(3, TextureId::NONE, [0.0, 0.0, 100.0, 100.0]),
        ])]);
        let plan = plan_frame(&data, ample()).expect("plan");
        assert_eq!(plan.items.len(), 3);
        assert!(matches!(plan.items[0], PlanItem::Draw(_)));
        assert!(matches!(plan.items[1], PlanItem::Callback { cmd: 1, .. }));
        assert!(matches!(plan.items[2], PlanItem::Draw(_)));
    }

    #[test]
    fn invalid_list_is_dropped_without_aborting_later_lists() {
        let mut bad = list_with_cmds(vec![elements(
            3,
            TextureId::NONE,
            [0.0, 0.0, 100.0, 100.0],
        )]);
        bad.indices.clear();
        let good = list_with_cmds(vec![elements(
            3,
            TextureId::NONE,
            [0.0, 0.0, 100.0, 100.0],
        )]);
        let plan = plan_frame(&frame(vec![bad, good]), ample()).expect("plan");
        assert_eq!(plan.invalid_lists, 1);
        assert_eq!(plan.uploads.len(), 1);
        assert_eq!(plan.uploads[0].list, 1);
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn capacity_exhaustion_drops_remaining_lists() {
        let one_quad = || {
            list_with_cmds(vec![elements(
                6,
                TextureId::NONE,
                [0.0, 0.0, 100.0, 100.0],
            )])
        };
        let data = frame(vec![one_quad(), one_quad(), one_quad()]);
        // Room for exactly one list's vertices.
        let limits = FrameLimits {
            vertex_bytes: aligned(6 * DrawVert::STRIDE),
            index_bytes: 1 << 20,
        };
        let plan = plan_frame(&data, limits).expect("plan");
        assert_eq!(plan.uploads.len(), 1);
        assert_eq!(draws(&plan).len(), 1);
        assert_eq!(plan.dropped_lists, 2);
    }

    #[test]
    fn single_command_frame_plans_one_upload_one_draw() {
        let data = frame(vec![list_with_cmds(vec![elements(
            6,
            TextureId::NONE,
            [0.0, 0.0, 200.0, 100.0],
        )])]);
        let plan = plan_frame(&data, ample()).expect("plan");
        assert_eq!(plan.uploads.len(), 1);
        assert_eq!(plan.items.len(), 1);
        assert_eq!(plan.dropped_lists, 0);
        assert_eq!(plan.invalid_lists, 0);
        let d = draws(&plan);
        assert_eq!(d[0].index_count, 6);
        assert_eq!(d[0].scissor, Scissor { x: 0, y: 0, width: 200, height: 100 });
    }

    // ── scissor math ──────────────────────────────────────────────────────

    #[test]
    fn scissor_clamps_negative_min_to_zero() {
        let s = scissor_for_clip([-20.0, -10.0, 100.0, 50.0], NO_OFFSET, UNIT_SCALE, FB)
            .expect("scissor");
        assert_eq!(s, Scissor { x: 0, y: 0, width: 100, height: 50 });
    }

    #[test]
    fn scissor_clamps_max_to_framebuffer() {
        let s = scissor_for_clip([700.0, 500.0, 900.0, 700.0], NO_OFFSET, UNIT_SCALE, FB)
            .expect("scissor");
        assert_eq!(s, Scissor { x: 700, y: 500, width: 100, height: 100 });
    }

    #[test]
    fn clip_touching_far_edge_is_outside() {
        // min == framebuffer extent fails the strict visibility test.
        assert!(scissor_for_clip([800.0, 0.0, 900.0, 50.0], NO_OFFSET, UNIT_SCALE, FB).is_none());
        assert!(scissor_for_clip([0.0, 600.0, 50.0, 700.0], NO_OFFSET, UNIT_SCALE, FB).is_none());
        // max == 0 passes the visibility test but clamps to nothing.
        assert!(scissor_for_clip([-50.0, 0.0, 0.0, 50.0], NO_OFFSET, UNIT_SCALE, FB).is_none());
    }

    #[test]
    fn inverted_clip_is_skipped() {
        assert!(
            scissor_for_clip([100.0, 100.0, 50.0, 50.0], NO_OFFSET, UNIT_SCALE, FB).is_none()
        );
    }

    #[test]
    fn scissor_honors_display_offset_and_scale() {
        let s = scissor_for_clip(
            [110.0, 120.0, 210.0, 170.0],
            [100.0, 100.0],
            [2.0, 2.0],
            (1600.0, 1200.0),
        )
        .expect("scissor");
        assert_eq!(s, Scissor { x: 20, y: 40, width: 200, height: 100 });
    }

    #[test]
    fn scissor_clamped_to_smaller_attachment() {
        let s = Scissor { x: 100, y: 100, width: 200, height: 200 };
        assert_eq!(
            s.clamped_to(150, 150),
            Some(Scissor { x: 100, y: 100, width: 50, height: 50 })
        );
        assert_eq!(s.clamped_to(100, 300), None);
        assert_eq!(s.clamped_to(300, 300), Some(s));
    }

    // ── projection ────────────────────────────────────────────────────────

    fn project(m: &[[f32; 4]; 4], x: f32, y: f32) -> (f32, f32) {
        // Column-major multiply with z = 0, w = 1.
        (m[0][0] * x + m[3][0], m[1][1] * y + m[3][1])
    }

    fn assert_projects_to(m: &[[f32; 4]; 4], px: (f32, f32), ndc: (f32, f32)) {
        let (x, y) = project(m, px.0, px.1);
        assert!(
            (x - ndc.0).abs() < 1e-5 && (y - ndc.1).abs() < 1e-5,
            "({}, {}) projected to ({x}, {y}), expected ({}, {})",
            px.0,
            px.1,
            ndc.0,
            ndc.1,
        );
    }

    #[test]
    fn projection_maps_display_rect_to_ndc() {
        let m = ortho_projection([0.0, 0.0], (800.0, 600.0));
        assert_projects_to(&m, (0.0, 0.0), (-1.0, 1.0));
        assert_projects_to(&m, (800.0, 600.0), (1.0, -1.0));
        assert_projects_to(&m, (400.0, 300.0), (0.0, 0.0));
    }

    #[test]
    fn projection_depth_maps_into_unit_range() {
        let m = ortho_projection([0.0, 0.0], (800.0, 600.0));
        // z column scales 0..1000 onto 0..1.
        assert_eq!(m[2][2], 1.0 / 1000.0);
        assert_eq!(m[3][2], 0.0);
    }

    #[test]
    fn projection_honors_display_origin() {
        let m = ortho_projection([100.0, 50.0], (800.0, 600.0));
        assert_projects_to(&m, (100.0, 50.0), (-1.0, 1.0));
        assert_projects_to(&m, (900.0, 650.0), (1.0, -1.0));
    }
}
