//! The 4x4 tile abstraction: source-pixel gather with edge clamp and
//! alpha-mix classification.

use crate::driver::source::SourceImage;
use crate::format::Format;

/// Alpha-channel classification of a tile's 16 source texels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlphaMix {
    #[default]
    Unknown,
    Opaque,
    Transparent,
    Translucent,
    AllZeroAlpha,
}

/// An RGBA texel, channels in `[0.0, 1.0]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Texel {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// A gathered 4x4 tile of source pixels, stored column-major (vertical
/// scan) to match the bit layout ETC1-family encoders expect.
#[derive(Clone, Debug)]
pub struct Tile {
    pub source: [Texel; 16],
    pub origin_x: u32,
    pub origin_y: u32,
    pub alpha_mix: AlphaMix,
    pub has_color: bool,
    pub has_punch_through: bool,
}

impl Tile {
    /// Gather the 16 texels at `(origin_x, origin_y)` from `image`,
    /// clamping out-of-bounds reads to the nearest in-bounds texel, then
    /// classify alpha and color content for `format`.
    pub fn gather(image: &dyn SourceImage, origin_x: u32, origin_y: u32, format: Format) -> Self {
        let mut source = [Texel::default(); 16];
        let mut pixel = 0usize;
        for x in 0..4u32 {
            for y in 0..4u32 {
                source[pixel] = image.pixel_at(origin_x + x, origin_y + y);
                pixel += 1;
            }
        }

        let has_color = !source.iter().all(|p| p.r == p.g && p.r == p.b);

        let mut has_punch_through = false;
        let mut opaque = 0usize;
        let mut transparent = 0usize;
        let mut any_rgb_nonzero_when_transparent = false;

        for p in &mut source {
            if !format.has_alpha() {
                p.a = 1.0;
            } else if format.is_punch_through() {
                if p.a >= 0.5 {
                    p.a = 1.0;
                } else {
                    p.a = 0.0;
                    has_punch_through = true;
                }
            }

            if p.a == 1.0 {
                opaque += 1;
            } else if p.a == 0.0 {
                transparent += 1;
                if p.r != 0.0 || p.g != 0.0 || p.b != 0.0 {
                    any_rgb_nonzero_when_transparent = true;
                }
            }
        }

        let alpha_mix = if opaque == 16 {
            AlphaMix::Opaque
        } else if transparent == 16 {
            if any_rgb_nonzero_when_transparent {
                AlphaMix::AllZeroAlpha
            } else {
                AlphaMix::Transparent
            }
        } else {
            AlphaMix::Translucent
        };

        Self {
            source,
            origin_x,
            origin_y,
            alpha_mix,
            has_color,
            has_punch_through,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::source::RgbaSurface;
    use pretty_assertions::assert_eq;

    #[test]
    fn edge_clamp_repeats_border_texel() {
        let surface = RgbaSurface::from_rgba8(2, 2, &[255, 0, 0, 255, 0, 255, 0, 255, 0, 0, 255, 255, 255, 255, 0, 255]);
        let tile = Tile::gather(&surface, 0, 0, Format::Rgba8);
        // out-of-bounds reads at x=2,3 / y=2,3 should clamp to x=1/y=1
        let clamped = tile.source[15];
        let direct = surface.pixel_at(1, 1);
        assert_eq!(clamped, direct);
    }

    #[test]
    fn all_opaque_classifies_opaque() {
        let surface = RgbaSurface::from_rgba8(4, 4, &[255u8; 64]);
        let tile = Tile::gather(&surface, 0, 0, Format::Rgba8);
        assert_eq!(tile.alpha_mix, AlphaMix::Opaque);
    }

    #[test]
    fn all_zero_alpha_classifies_transparent() {
        let mut data = vec![0u8; 64];
        for p in data.chunks_exact_mut(4) {
            p[3] = 0;
        }
        let surface = RgbaSurface::from_rgba8(4, 4, &data);
        let tile = Tile::gather(&surface, 0, 0, Format::Rgba8);
        assert_eq!(tile.alpha_mix, AlphaMix::Transparent);
    }

    #[test]
    fn punch_through_snaps_alpha() {
        let mut data = vec![0u8; 64];
        for (i, p) in data.chunks_exact_mut(4).enumerate() {
            p[0] = 10;
            p[3] = if i % 2 == 0 { 200 } else { 50 };
        }
        let surface = RgbaSurface::from_rgba8(4, 4, &data);
        let tile = Tile::gather(&surface, 0, 0, Format::Rgb8A1);
        assert!(tile.has_punch_through);
        assert!(tile.source.iter().all(|p| p.a == 0.0 || p.a == 1.0));
    }
}
