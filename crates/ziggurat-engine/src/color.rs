//! Color values shared between the engine and overlay producers.

/// Straight-alpha RGBA with `[0, 1]` components.
///
/// Values are non-linear (sRGB-encoded); the surface format handles the
/// transfer function.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct ColorRgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl ColorRgba {
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn black() -> Self {
        Self::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub const fn white() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }

    /// Quantizes to the normalized-u8 layout vertex color attributes use,
    /// clamping each component into range first.
    #[inline]
    pub fn to_unorm8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unorm8_endpoints() {
        assert_eq!(ColorRgba::black().to_unorm8(), [0, 0, 0, 255]);
        assert_eq!(ColorRgba::white().to_unorm8(), [255, 255, 255, 255]);
    }

    #[test]
    fn unorm8_clamps_out_of_range() {
        let c = ColorRgba::new(-1.0, 2.0, 0.5, 1.5);
        assert_eq!(c.to_unorm8(), [0, 255, 128, 255]);
    }
}
