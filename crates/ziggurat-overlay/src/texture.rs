//! Packed texture identifiers.
//!
//! Draw commands carry a single opaque id so producers never hold GPU
//! resources. The id packs a registry slot plus render hints; the bridge
//! decodes it with [`TextureRef::unpack`] rather than reinterpreting bits
//! at the draw site.

/// Registry slot for a texture known to the bridge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TextureSlot(pub u16);

impl TextureSlot {
    /// Slot the font atlas occupies after init.
    pub const ATLAS: TextureSlot = TextureSlot(0);
}

/// Opaque id stored in [`DrawCmdParams`](crate::draw::DrawCmdParams).
///
/// Bit layout (low to high): slot 0..16, flags 16..24, mip level 24..32.
/// The upper 32 bits are reserved and always zero. The all-zero value is
/// [`TextureId::NONE`], distinct from any packed reference because the
/// atlas reference always carries the blend flag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct TextureId(pub u64);

impl TextureId {
    /// "No texture": draw with the font atlas, alpha blending on.
    pub const NONE: TextureId = TextureId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

const SLOT_SHIFT: u64 = 0;
const FLAGS_SHIFT: u64 = 16;
const MIP_SHIFT: u64 = 24;

const FLAG_ALPHA_BLEND: u8 = 1 << 0;

/// Decoded form of a [`TextureId`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureRef {
    pub slot: TextureSlot,

    /// Draw with alpha blending instead of opaque.
    pub alpha_blend: bool,

    /// Mip level to sample; non-zero selects the image pipeline with an
    /// explicit LOD.
    pub mip_level: u8,
}

impl TextureRef {
    /// Reference to the font atlas. Packs to a non-zero id because the
    /// blend flag is set, keeping it distinct from [`TextureId::NONE`].
    pub const ATLAS: TextureRef = TextureRef {
        slot: TextureSlot::ATLAS,
        alpha_blend: true,
        mip_level: 0,
    };

    pub fn pack(self) -> TextureId {
        let mut flags = 0u8;
        if self.alpha_blend {
            flags |= FLAG_ALPHA_BLEND;
        }
        TextureId(
            (self.slot.0 as u64) << SLOT_SHIFT
                | (flags as u64) << FLAGS_SHIFT
                | (self.mip_level as u64) << MIP_SHIFT,
        )
    }

    /// Decodes an id. [`TextureId::NONE`] resolves to the atlas reference.
    pub fn unpack(id: TextureId) -> TextureRef {
        if id.is_none() {
            return TextureRef::ATLAS;
        }
        let slot = (id.0 >> SLOT_SHIFT) as u16;
        let flags = (id.0 >> FLAGS_SHIFT) as u8;
        let mip_level = (id.0 >> MIP_SHIFT) as u8;
        TextureRef {
            slot: TextureSlot(slot),
            alpha_blend: flags & FLAG_ALPHA_BLEND != 0,
            mip_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_round_trips() {
        let refs = [
            TextureRef {
                slot: TextureSlot(0),
                alpha_blend: true,
                mip_level: 0,
            },
            TextureRef {
                slot: TextureSlot(7),
                alpha_blend: false,
                mip_level: 3,
            },
            TextureRef {
                slot: TextureSlot(u16::MAX),
                alpha_blend: true,
                mip_level: u8::MAX,
            },
        ];
        for r in refs {
            assert_eq!(TextureRef::unpack(r.pack()), r);
        }
    }

    #[test]
    fn fields_do_not_bleed() {
        let packed = TextureRef {
            slot: TextureSlot(0xFFFF),
            alpha_blend: false,
            mip_level: 0,
        }
        .pack();
        let back = TextureRef::unpack(packed);
        assert!(!back.alpha_blend);
        assert_eq!(back.mip_level, 0);

        let packed = TextureRef {
            slot: TextureSlot(0),
            alpha_blend: false,
            mip_level: 0xFF,
        }
        .pack();
        let back = TextureRef::unpack(packed);
        assert_eq!(back.slot, TextureSlot(0));
        assert!(!back.alpha_blend);
    }

    #[test]
    fn none_resolves_to_blended_atlas() {
        let r = TextureRef::unpack(TextureId::NONE);
        assert_eq!(r.slot, TextureSlot::ATLAS);
        assert!(r.alpha_blend);
        assert_eq!(r.mip_level, 0);
    }

    #[test]
    fn atlas_reference_is_not_the_null_id() {
        assert_ne!(TextureRef::ATLAS.pack(), TextureId::NONE);
    }
}
