//! Builds the overlay draw data for the playground HUD.
//!
//! The HUD is ordinary geometry: every quad, glyph, and bar ends up as
//! vertices in one [`DrawList`], split into two commands so the panel
//! interior gets its own clip rectangle. Coordinates are framebuffer
//! pixels; the scale factor stays at one.

use ziggurat_overlay::{
    DrawCmd, DrawCmdParams, DrawData, DrawIdx, DrawList, DrawVert, FontAtlas, FontKind, TextureId,
};

/// Inputs sampled by the app once per frame.
pub struct HudFrame<'a> {
    pub atlas: &'a FontAtlas,
    pub display_size: [f32; 2],
    pub status: &'a str,
    pub fps: f32,
    pub frame_index: u64,
    /// Recent frame times in seconds, oldest first.
    pub dt_history: &'a [f32],
    pub spin_angle: f32,
    pub pointer: [f32; 2],
    pub wheel: f32,
}

const PANEL_POS: [f32; 2] = [16.0, 16.0];
const PANEL_WIDTH: f32 = 400.0;
const PADDING: f32 = 10.0;
const SPARK_HEIGHT: f32 = 30.0;

const PANEL_BG: [u8; 4] = [16, 20, 30, 224];
const HEADER_BG: [u8; 4] = [32, 40, 58, 240];
const TEXT: [u8; 4] = [220, 226, 235, 255];
const DIM: [u8; 4] = [140, 150, 165, 255];
const ACCENT: [u8; 4] = [120, 200, 255, 255];
const SPARK: [u8; 4] = [90, 170, 120, 255];
const SPINNER: [u8; 4] = [255, 180, 90, 255];

pub fn build(frame: &HudFrame<'_>) -> DrawData {
    let atlas = frame.atlas;
    let white = atlas.white_uv();
    let regular = atlas.line_metrics(FontKind::Regular);
    let mono = atlas.line_metrics(FontKind::Mono);

    let header_h = regular.line_height + PADDING;
    let body_lines = 5.0;
    let panel_h =
        header_h + PADDING + body_lines * mono.line_height + PADDING + SPARK_HEIGHT + PADDING;
    let [px, py] = PANEL_POS;

    let full_clip = [0.0, 0.0, frame.display_size[0], frame.display_size[1]];
    let mut list = ListBuilder::new(full_clip);

    // ── chrome, clipped to the whole display ────────────────────────────
    list.rect([px, py], [PANEL_WIDTH, panel_h], white, PANEL_BG);
    list.rect([px, py], [PANEL_WIDTH, header_h], white, HEADER_BG);
    draw_text(
        &mut list,
        atlas,
        FontKind::Regular,
        [px + PADDING, py + PADDING / 2.0 + regular.ascent],
        "ziggurat playground",
        ACCENT,
    );
    spinner(
        &mut list,
        [px + PANEL_WIDTH - header_h / 2.0, py + header_h / 2.0],
        header_h * 0.28,
        frame.spin_angle,
        white,
        SPINNER,
    );

    // ── body, clipped to the panel interior ─────────────────────────────
    list.set_clip([px, py + header_h, px + PANEL_WIDTH, py + panel_h]);

    let left = px + PADDING;
    let mut baseline = py + header_h + PADDING + mono.ascent;
    let dt_ms = frame.dt_history.last().copied().unwrap_or(0.0) * 1000.0;

    let stats = format!("fps {:6.1}   dt {:6.2} ms", frame.fps, dt_ms);
    draw_text(&mut list, atlas, FontKind::Mono, [left, baseline], &stats, TEXT);
    baseline += mono.line_height;

    let counter = format!("frame {}", frame.frame_index);
    draw_text(&mut list, atlas, FontKind::Mono, [left, baseline], &counter, DIM);
    baseline += mono.line_height;

    let pointer = format!(
        "pointer {:7.1} {:7.1}   wheel {:8.1}",
        frame.pointer[0], frame.pointer[1], frame.wheel
    );
    draw_text(&mut list, atlas, FontKind::Mono, [left, baseline], &pointer, DIM);
    baseline += mono.line_height;

    draw_text(&mut list, atlas, FontKind::Mono, [left, baseline], frame.status, TEXT);
    baseline += mono.line_height;

    draw_text(
        &mut list,
        atlas,
        FontKind::Mono,
        [left, baseline],
        "[r] reload scripts   [f1] toggle overlay",
        DIM,
    );
    baseline += mono.line_height;

    frame_time_bars(
        &mut list,
        [left, baseline - mono.ascent + PADDING],
        [PANEL_WIDTH - 2.0 * PADDING, SPARK_HEIGHT],
        frame.dt_history,
        white,
    );

    DrawData {
        display_pos: [0.0, 0.0],
        display_size: frame.display_size,
        framebuffer_scale: [1.0, 1.0],
        lists: vec![list.finish()],
    }
}

// ── geometry helpers ─────────────────────────────────────────────────────────

/// Accumulates vertices and splits commands at clip changes.
struct ListBuilder {
    vertices: Vec<DrawVert>,
    indices: Vec<DrawIdx>,
    commands: Vec<DrawCmd>,
    clip: [f32; 4],
    cmd_start: u32,
}

impl ListBuilder {
    fn new(clip: [f32; 4]) -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
            commands: Vec::new(),
            clip,
            cmd_start: 0,
        }
    }

    fn set_clip(&mut self, clip: [f32; 4]) {
        if clip != self.clip {
            self.flush();
            self.clip = clip;
        }
    }

    fn flush(&mut self) {
        let end = self.indices.len() as u32;
        if end > self.cmd_start {
            self.commands.push(DrawCmd::Elements {
                count: end - self.cmd_start,
                params: DrawCmdParams {
                    clip_rect: self.clip,
                    texture: TextureId::NONE,
                    idx_offset: self.cmd_start,
                    vtx_offset: 0,
                },
            });
            self.cmd_start = end;
        }
    }

    /// Four corners in clockwise order, one uv for all of them.
    fn corners(&mut self, corners: [[f32; 2]; 4], uv: [f32; 2], color: [u8; 4]) {
        let base = self.vertices.len() as DrawIdx;
        for pos in corners {
            self.vertices.push(DrawVert { pos, uv, color });
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Axis-aligned textured quad.
    fn quad_uv(
        &mut self,
        min: [f32; 2],
        max: [f32; 2],
        uv_min: [f32; 2],
        uv_max: [f32; 2],
        color: [u8; 4],
    ) {
        let base = self.vertices.len() as DrawIdx;
        self.vertices.push(DrawVert { pos: min, uv: uv_min, color });
        self.vertices.push(DrawVert {
            pos: [max[0], min[1]],
            uv: [uv_max[0], uv_min[1]],
            color,
        });
        self.vertices.push(DrawVert { pos: max, uv: uv_max, color });
        self.vertices.push(DrawVert {
            pos: [min[0], max[1]],
            uv: [uv_min[0], uv_max[1]],
            color,
        });
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Solid rectangle through the atlas white pixel.
    fn rect(&mut self, pos: [f32; 2], size: [f32; 2], white: [f32; 2], color: [u8; 4]) {
        self.quad_uv(
            pos,
            [pos[0] + size[0], pos[1] + size[1]],
            white,
            white,
            color,
        );
    }

    fn finish(mut self) -> DrawList {
        self.flush();
        DrawList {
            vertices: self.vertices,
            indices: self.indices,
            commands: self.commands,
        }
    }
}

/// Lays out one line of text. `origin` is the pen position on the baseline;
/// returns the pen x after the last glyph.
fn draw_text(
    list: &mut ListBuilder,
    atlas: &FontAtlas,
    kind: FontKind,
    origin: [f32; 2],
    text: &str,
    color: [u8; 4],
) -> f32 {
    let mut pen = origin[0];
    for ch in text.chars() {
        let Some(glyph) = atlas.glyph(kind, ch) else {
            continue;
        };
        if glyph.size[0] > 0.0 && glyph.size[1] > 0.0 {
            let min = [pen + glyph.offset[0], origin[1] + glyph.offset[1]];
            let max = [min[0] + glyph.size[0], min[1] + glyph.size[1]];
            list.quad_uv(min, max, glyph.uv_min, glyph.uv_max, color);
        }
        pen += glyph.advance;
    }
    pen
}

/// One bar per frame-time sample, normalized so 33 ms fills the row.
fn frame_time_bars(
    list: &mut ListBuilder,
    pos: [f32; 2],
    size: [f32; 2],
    samples: &[f32],
    white: [f32; 2],
) {
    if samples.is_empty() {
        return;
    }
    let slot = size[0] / samples.len() as f32;
    let bar = (slot - 1.0).max(1.0);
    for (i, dt) in samples.iter().enumerate() {
        let t = (dt / 0.033).clamp(0.05, 1.0);
        let h = t * size[1];
        let x = pos[0] + i as f32 * slot;
        list.rect([x, pos[1] + size[1] - h], [bar, h], white, SPARK);
    }
}

/// Square spun around its center by `angle` radians.
fn spinner(
    list: &mut ListBuilder,
    center: [f32; 2],
    radius: f32,
    angle: f32,
    white: [f32; 2],
    color: [u8; 4],
) {
    let corner = |k: f32| {
        let a = angle + k * std::f32::consts::FRAC_PI_2;
        [center[0] + radius * a.cos(), center[1] + radius * a.sin()]
    };
    list.corners([corner(0.0), corner(1.0), corner(2.0), corner(3.0)], white, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(atlas: &FontAtlas) -> HudFrame<'_> {
        HudFrame {
            atlas,
            display_size: [1920.0, 1080.0],
            status: "steady",
            fps: 60.0,
            frame_index: 420,
            dt_history: &[0.016, 0.017, 0.015, 0.030],
            spin_angle: 0.7,
            pointer: [512.0, 300.0],
            wheel: -200.0,
        }
    }

    #[test]
    fn hud_draw_data_is_valid() {
        let atlas = FontAtlas::build(16.0).unwrap();
        let frame = test_frame(&atlas);
        let data = build(&frame);

        assert_eq!(data.display_size, [1920.0, 1080.0]);
        assert_eq!(data.lists.len(), 1);
        let list = &data.lists[0];
        assert!(list.validate());
        assert!(!list.vertices.is_empty());
        assert_eq!(list.indices.len() % 3, 0);
        assert!(list.commands.len() >= 2);

        for cmd in &list.commands {
            let clip = cmd.params().clip_rect;
            assert!(clip[0] >= 0.0 && clip[1] >= 0.0);
            assert!(clip[2] <= 1920.0 && clip[3] <= 1080.0);
            assert!(clip[0] < clip[2] && clip[1] < clip[3]);
        }
        for vert in &list.vertices {
            assert!(vert.pos[0].is_finite() && vert.pos[1].is_finite());
        }
    }

    #[test]
    fn every_command_uses_the_null_texture() {
        let atlas = FontAtlas::build(16.0).unwrap();
        let data = build(&test_frame(&atlas));
        for cmd in &data.lists[0].commands {
            assert!(cmd.params().texture.is_none());
        }
    }

    #[test]
    fn spinner_angle_changes_the_geometry() {
        let atlas = FontAtlas::build(16.0).unwrap();
        let mut a = test_frame(&atlas);
        a.spin_angle = 0.0;
        let mut b = test_frame(&atlas);
        b.spin_angle = 1.0;
        assert_ne!(build(&a).lists[0].vertices, build(&b).lists[0].vertices);
    }

    #[test]
    fn text_advances_the_pen() {
        let atlas = FontAtlas::build(16.0).unwrap();
        let mut list = ListBuilder::new([0.0, 0.0, 100.0, 100.0]);
        let end = draw_text(&mut list, &atlas, FontKind::Mono, [5.0, 20.0], "abc", TEXT);
        assert!(end > 5.0);
        assert_eq!(list.vertices.len(), 12);
    }

    #[test]
    fn empty_history_draws_no_bars() {
        let mut list = ListBuilder::new([0.0, 0.0, 100.0, 100.0]);
        frame_time_bars(&mut list, [0.0, 0.0], [80.0, 20.0], &[], [0.5, 0.5]);
        assert!(list.vertices.is_empty());
    }
}
