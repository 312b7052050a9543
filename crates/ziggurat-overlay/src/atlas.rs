//! Baked font atlas.
//!
//! Built once during bridge init from embedded font binaries and uploaded as
//! a single immutable RGBA8 texture (white RGB, glyph coverage in alpha).
//! Two faces are baked: the regular face at the configured size and a
//! monospace face three points smaller. Two symbol codepoint windows (arrows
//! and mathematical operators) are merged into the regular face at the
//! smaller size. A reserved opaque white region serves untextured fills.

use std::collections::HashMap;
use std::fmt;

// ── atlas constants ────────────────────────────────────────────────────────

const ATLAS_SIZE: u32 = 1024;
const GLYPH_PADDING: u32 = 1; // pixels between glyphs in the atlas

const WHITE_REGION: u32 = 4; // side of the reserved white square

/// Codepoint windows merged into the regular face: arrows (U+2190..U+21FF)
/// and mathematical operators (U+2200..U+22FF).
const SYMBOL_WINDOWS: [(u32, u32); 2] = [(0x2190, 0x21FF), (0x2200, 0x22FF)];

const REGULAR_TTF: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
const MONO_TTF: &[u8] = include_bytes!("../assets/fonts/DejaVuSansMono.ttf");
const SYMBOL_TTF: &[u8] = include_bytes!("../assets/fonts/DejaVuMathTeXGyre.ttf");

// ── error ──────────────────────────────────────────────────────────────────

/// Error returned by [`FontAtlas::build`].
#[derive(Debug, Clone)]
pub struct AtlasError(pub String);

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "font atlas error: {}", self.0)
    }
}

impl std::error::Error for AtlasError {}

// ── public types ───────────────────────────────────────────────────────────

/// Which baked face a glyph lookup targets.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FontKind {
    Regular,
    Mono,
}

/// Placement and layout data for one baked glyph.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphInfo {
    /// Top-left of the glyph in normalized atlas coordinates.
    pub uv_min: [f32; 2],
    /// Bottom-right of the glyph in normalized atlas coordinates.
    pub uv_max: [f32; 2],
    /// Bitmap extent in pixels. Zero for glyphs with no coverage (space).
    pub size: [f32; 2],
    /// Displacement from the baseline pen position to the bitmap's top-left
    /// corner, y-down.
    pub offset: [f32; 2],
    /// Horizontal pen advance in pixels.
    pub advance: f32,
}

/// Vertical layout metrics for one baked face.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineMetrics {
    /// Baseline distance from the top of a line, positive.
    pub ascent: f32,
    /// Extent below the baseline, negative or zero.
    pub descent: f32,
    /// Recommended baseline-to-baseline distance.
    pub line_height: f32,
}

// ── atlas ──────────────────────────────────────────────────────────────────

/// Immutable glyph atlas: pixel data plus per-glyph placement tables.
///
/// All rasterization happens in [`build`](Self::build); afterwards the atlas
/// is read-only and safe to share with the upload path.
pub struct FontAtlas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    glyphs: HashMap<(FontKind, char), GlyphInfo>,
    metrics: HashMap<FontKind, LineMetrics>,
    white_uv: [f32; 2],
    regular_size: f32,
    mono_size: f32,
}

impl FontAtlas {
    /// Bakes the atlas. `base_size` is the regular face's pixel size; the
    /// mono face and the merged symbol windows use `base_size - 3`.
    pub fn build(base_size: f32) -> Result<FontAtlas, AtlasError> {
        if !base_size.is_finite() || base_size < 4.0 {
            return Err(AtlasError(format!("unusable font size {base_size}")));
        }

        let settings = fontdue::FontSettings::default();
        let regular = fontdue::Font::from_bytes(REGULAR_TTF, settings)
            .map_err(|e| AtlasError(format!("regular face: {e}")))?;
        let mono = fontdue::Font::from_bytes(MONO_TTF, settings)
            .map_err(|e| AtlasError(format!("mono face: {e}")))?;
        let symbols = fontdue::Font::from_bytes(SYMBOL_TTF, settings)
            .map_err(|e| AtlasError(format!("symbol face: {e}")))?;

        let regular_size = base_size;
        let mono_size = base_size - 3.0;

        let mut baker = Baker::new();
        baker.reserve_white();

        for ch in ascii_charset() {
            baker.bake(FontKind::Regular, &regular, ch, regular_size);
            baker.bake(FontKind::Mono, &mono, ch, mono_size);
        }
        // Symbol windows land in the regular face's table so producers need
        // only one lookup key per character.
        for &(lo, hi) in &SYMBOL_WINDOWS {
            for cp in lo..=hi {
                let Some(ch) = char::from_u32(cp) else { continue };
                if symbols.lookup_glyph_index(ch) == 0 {
                    continue;
                }
                baker.bake(FontKind::Regular, &symbols, ch, mono_size);
            }
        }

        let mut metrics = HashMap::new();
        metrics.insert(FontKind::Regular, line_metrics_of(&regular, regular_size));
        metrics.insert(FontKind::Mono, line_metrics_of(&mono, mono_size));

        log::debug!(
            "font atlas baked: {} glyphs, {}x{} px",
            baker.glyphs.len(),
            ATLAS_SIZE,
            ATLAS_SIZE
        );

        Ok(FontAtlas {
            width: ATLAS_SIZE,
            height: ATLAS_SIZE,
            pixels: baker.pixels,
            glyphs: baker.glyphs,
            metrics,
            white_uv: baker.white_uv,
            regular_size,
            mono_size,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major, `width * height * 4` bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Looks up a baked glyph. Symbol-window characters are reachable via
    /// [`FontKind::Regular`].
    pub fn glyph(&self, kind: FontKind, ch: char) -> Option<&GlyphInfo> {
        self.glyphs.get(&(kind, ch))
    }

    pub fn line_metrics(&self, kind: FontKind) -> LineMetrics {
        self.metrics.get(&kind).copied().unwrap_or(LineMetrics {
            ascent: self.font_size(kind) * 0.8,
            descent: self.font_size(kind) * -0.2,
            line_height: self.font_size(kind) * 1.2,
        })
    }

    /// Center of the reserved opaque white region, in normalized atlas
    /// coordinates. Untextured fills sample here.
    pub fn white_uv(&self) -> [f32; 2] {
        self.white_uv
    }

    pub fn font_size(&self, kind: FontKind) -> f32 {
        match kind {
            FontKind::Regular => self.regular_size,
            FontKind::Mono => self.mono_size,
        }
    }
}

fn ascii_charset() -> impl Iterator<Item = char> {
    (0x20u8..=0x7E).map(char::from)
}

fn line_metrics_of(font: &fontdue::Font, size: f32) -> LineMetrics {
    match font.horizontal_line_metrics(size) {
        Some(m) => LineMetrics {
            ascent: m.ascent,
            descent: m.descent,
            line_height: m.new_line_size,
        },
        None => LineMetrics {
            ascent: size * 0.8,
            descent: size * -0.2,
            line_height: size * 1.2,
        },
    }
}

// ── baking ─────────────────────────────────────────────────────────────────

/// Shelf packer plus the pixel buffer under construction.
struct Baker {
    pixels: Vec<u8>,
    glyphs: HashMap<(FontKind, char), GlyphInfo>,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
    full: bool,
    white_uv: [f32; 2],
}

impl Baker {
    fn new() -> Self {
        Self {
            pixels: vec![0; (ATLAS_SIZE * ATLAS_SIZE * 4) as usize],
            glyphs: HashMap::new(),
            cursor_x: GLYPH_PADDING,
            cursor_y: GLYPH_PADDING,
            row_height: 0,
            full: false,
            white_uv: [0.0, 0.0],
        }
    }

    fn reserve_white(&mut self) {
        let Some((x, y)) = self.place(WHITE_REGION, WHITE_REGION) else {
            return;
        };
        for row in 0..WHITE_REGION {
            for col in 0..WHITE_REGION {
                let idx = pixel_index(x + col, y + row);
                self.pixels[idx..idx + 4].copy_from_slice(&[0xFF; 4]);
            }
        }
        let half = WHITE_REGION as f32 / 2.0;
        self.white_uv = [
            (x as f32 + half) / ATLAS_SIZE as f32,
            (y as f32 + half) / ATLAS_SIZE as f32,
        ];
    }

    fn bake(&mut self, kind: FontKind, font: &fontdue::Font, ch: char, size: f32) {
        if self.glyphs.contains_key(&(kind, ch)) {
            return;
        }

        let (m, coverage) = font.rasterize(ch, size);

        // Coverage-free glyphs (space) still carry an advance; park their uv
        // on the white region so a stray quad stays harmless.
        if m.width == 0 || m.height == 0 {
            self.glyphs.insert(
                (kind, ch),
                GlyphInfo {
                    uv_min: self.white_uv,
                    uv_max: self.white_uv,
                    size: [0.0, 0.0],
                    offset: [0.0, 0.0],
                    advance: m.advance_width,
                },
            );
            return;
        }

        let Some((x, y)) = self.place(m.width as u32, m.height as u32) else {
            return;
        };

        for row in 0..m.height {
            for col in 0..m.width {
                let a = coverage[row * m.width + col];
                let idx = pixel_index(x + col as u32, y + row as u32);
                self.pixels[idx] = 0xFF;
                self.pixels[idx + 1] = 0xFF;
                self.pixels[idx + 2] = 0xFF;
                self.pixels[idx + 3] = a;
            }
        }

        let atlas_f = ATLAS_SIZE as f32;
        self.glyphs.insert(
            (kind, ch),
            GlyphInfo {
                uv_min: [x as f32 / atlas_f, y as f32 / atlas_f],
                uv_max: [
                    (x + m.width as u32) as f32 / atlas_f,
                    (y + m.height as u32) as f32 / atlas_f,
                ],
                size: [m.width as f32, m.height as f32],
                offset: [m.xmin as f32, -(m.height as f32 + m.ymin as f32)],
                advance: m.advance_width,
            },
        );
    }

    /// Shelf placement. Advances to a new row when the rect doesn't fit
    /// horizontally; reports the atlas full at most once.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if self.full {
            return None;
        }

        if self.cursor_x + w + GLYPH_PADDING > ATLAS_SIZE {
            self.cursor_y += self.row_height + GLYPH_PADDING;
            self.cursor_x = GLYPH_PADDING;
            self.row_height = 0;
        }

        if self.cursor_y + h + GLYPH_PADDING > ATLAS_SIZE {
            log::warn!(
                "font atlas is full ({ATLAS_SIZE}x{ATLAS_SIZE}); \
                 some glyphs will not be baked"
            );
            self.full = true;
            return None;
        }

        let pos = (self.cursor_x, self.cursor_y);
        self.cursor_x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some(pos)
    }
}

fn pixel_index(x: u32, y: u32) -> usize {
    ((y * ATLAS_SIZE + x) * 4) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atlas() -> FontAtlas {
        FontAtlas::build(18.0).expect("atlas build")
    }

    #[test]
    fn pixel_buffer_matches_dimensions() {
        let a = atlas();
        assert_eq!(a.pixels().len(), (a.width() * a.height() * 4) as usize);
    }

    #[test]
    fn ascii_is_baked_for_both_faces() {
        let a = atlas();
        for ch in ['A', 'z', '0', '~', '!'] {
            assert!(a.glyph(FontKind::Regular, ch).is_some(), "regular {ch:?}");
            assert!(a.glyph(FontKind::Mono, ch).is_some(), "mono {ch:?}");
        }
    }

    #[test]
    fn symbol_windows_merge_into_regular() {
        let a = atlas();
        // U+2192 rightwards arrow, U+2211 n-ary summation.
        assert!(a.glyph(FontKind::Regular, '\u{2192}').is_some());
        assert!(a.glyph(FontKind::Regular, '\u{2211}').is_some());
        assert!(a.glyph(FontKind::Mono, '\u{2192}').is_none());
    }

    #[test]
    fn mono_face_is_three_points_smaller() {
        let a = atlas();
        assert_eq!(a.font_size(FontKind::Mono), a.font_size(FontKind::Regular) - 3.0);
    }

    #[test]
    fn white_region_is_opaque_white() {
        let a = atlas();
        let [u, v] = a.white_uv();
        let x = (u * a.width() as f32) as u32;
        let y = (v * a.height() as f32) as u32;
        let idx = pixel_index(x, y);
        assert_eq!(&a.pixels()[idx..idx + 4], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn glyph_uvs_are_normalized_and_ordered() {
        let a = atlas();
        let g = a.glyph(FontKind::Regular, 'M').copied().expect("glyph M");
        assert!(g.uv_min[0] >= 0.0 && g.uv_max[0] <= 1.0);
        assert!(g.uv_min[1] >= 0.0 && g.uv_max[1] <= 1.0);
        assert!(g.uv_min[0] < g.uv_max[0]);
        assert!(g.uv_min[1] < g.uv_max[1]);
        assert!(g.size[0] > 0.0 && g.size[1] > 0.0);
    }

    #[test]
    fn space_advances_without_coverage() {
        let a = atlas();
        let g = a.glyph(FontKind::Regular, ' ').copied().expect("space");
        assert_eq!(g.size, [0.0, 0.0]);
        assert!(g.advance > 0.0);
    }

    #[test]
    fn line_metrics_are_sane() {
        let a = atlas();
        let m = a.line_metrics(FontKind::Regular);
        assert!(m.ascent > 0.0);
        assert!(m.descent <= 0.0);
        assert!(m.line_height >= m.ascent - m.descent * 0.5);
    }

    #[test]
    fn tiny_size_is_rejected() {
        assert!(FontAtlas::build(1.0).is_err());
        assert!(FontAtlas::build(f32::NAN).is_err());
    }
}
