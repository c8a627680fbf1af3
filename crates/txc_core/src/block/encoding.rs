//! The per-tile `Encoding` contract: a tagged enum dispatching to the
//! concrete encoder for a [`Format`], rather than a trait object.
//!
//! A trait object would let Block hold "some encoder or other"; the tagged
//! enum instead makes "exactly one encoder, matching the image format" a
//! structural invariant that the compiler enforces, which is why this
//! reimplementation prefers it over the reference encoder's virtual-call
//! hierarchy (see `DESIGN.md`).

use super::a8::A8Encoder;
use super::r11::R11Encoder;
use super::rgb8::Rgb8Encoder;
use super::tile::{AlphaMix, Tile};
use crate::format::{ErrorMetric, Format};

/// Bytes produced for one tile: 8 for single-plane formats, 16 for
/// two-plane formats (RGBA8 = A8 || RGB8, RG11 = R || G).
#[derive(Clone, Debug)]
pub enum EncodedBlock {
    Single([u8; 8]),
    Dual([u8; 16]),
}

impl EncodedBlock {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            EncodedBlock::Single(b) => b,
            EncodedBlock::Dual(b) => b,
        }
    }

    /// Reconstruct from a raw slice previously produced by
    /// [`EncodedBlock::as_bytes`]. Panics if `bytes.len()` is neither 8 nor
    /// 16.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match bytes.len() {
            8 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(bytes);
                EncodedBlock::Single(b)
            }
            16 => {
                let mut b = [0u8; 16];
                b.copy_from_slice(bytes);
                EncodedBlock::Dual(b)
            }
            n => panic!("unexpected encoded block length {n}"),
        }
    }
}

/// Per-tile encoder state, tagged by format.
pub enum Encoding {
    R11(R11Encoder),
    Rg11(R11Encoder, R11Encoder),
    Rgb8(Rgb8Encoder),
    Rgba8(A8Encoder, Rgb8Encoder),
    Rgb8A1(Rgb8Encoder),
}

impl Encoding {
    #[must_use]
    pub fn new(format: Format) -> Self {
        match format {
            Format::R11 | Format::SignedR11 => Self::R11(R11Encoder::new()),
            Format::Rg11 | Format::SignedRg11 => Self::Rg11(R11Encoder::new(), R11Encoder::new()),
            Format::Rgb8 | Format::Srgb8 | Format::Etc1 => Self::Rgb8(Rgb8Encoder::new()),
            Format::Rgba8 | Format::Srgba8 => Self::Rgba8(A8Encoder::new(), Rgb8Encoder::new()),
            Format::Rgb8A1 | Format::Srgb8A1 => Self::Rgb8A1(Rgb8Encoder::new()),
        }
    }

    pub fn encode(&mut self, tile: &Tile, format: Format, error_metric: ErrorMetric) {
        let is_snorm = format.is_signed();
        let red: Vec<f32> = tile.source.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
        match self {
            Self::R11(r) => r.encode(&red, 4, is_snorm),
            Self::Rg11(r, g) => {
                r.encode(&red, 4, is_snorm);
                g.encode(&red[1..], 4, is_snorm);
            }
            Self::Rgb8(c) => c.encode(&tile.source, error_metric, false),
            Self::Rgba8(a, c) => {
                a.encode(&red[3..], 4, tile.alpha_mix);
                let transparent = tile.alpha_mix == AlphaMix::Transparent;
                c.encode(&tile.source, error_metric, transparent);
            }
            Self::Rgb8A1(c) => {
                // Punch-through formats snap per-texel alpha to {0, 1} during
                // `Tile::gather`; `has_punch_through` is only set when that
                // snap actually zeroed a texel, so it's the right guard for
                // whether this tile's colour search can be skipped entirely.
                let transparent = tile.has_punch_through && tile.alpha_mix != AlphaMix::Translucent;
                c.encode(&tile.source, error_metric, transparent);
            }
        }
    }

    pub fn perform_iteration(&mut self, tile: &Tile, effort: f32) {
        let red: Vec<f32> = tile.source.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
        match self {
            Self::R11(r) => r.perform_iteration(effort),
            Self::Rg11(r, g) => {
                r.perform_iteration(effort);
                g.perform_iteration(effort);
            }
            Self::Rgb8(c) => c.perform_iteration(effort),
            Self::Rgba8(a, c) => {
                a.perform_iteration(&red[3..], 4, effort);
                c.perform_iteration(effort);
            }
            Self::Rgb8A1(c) => c.perform_iteration(effort),
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        match self {
            Self::R11(r) => r.is_done(),
            Self::Rg11(r, g) => r.is_done() && g.is_done(),
            Self::Rgb8(c) => c.is_done(),
            Self::Rgba8(a, c) => a.is_done() && c.is_done(),
            Self::Rgb8A1(c) => c.is_done(),
        }
    }

    #[must_use]
    pub fn error(&self) -> f32 {
        match self {
            Self::R11(r) => r.error(),
            Self::Rg11(r, g) => r.error() + g.error(),
            Self::Rgb8(c) => c.error(),
            Self::Rgba8(_, c) => c.error(),
            Self::Rgb8A1(c) => c.error(),
        }
    }

    #[must_use]
    pub fn write_encoding_bits(&self) -> EncodedBlock {
        match self {
            Self::R11(r) => EncodedBlock::Single(r.write_encoding_bits()),
            Self::Rg11(r, g) => {
                let mut out = [0u8; 16];
                out[..8].copy_from_slice(&r.write_encoding_bits());
                out[8..].copy_from_slice(&g.write_encoding_bits());
                EncodedBlock::Dual(out)
            }
            Self::Rgb8(c) => EncodedBlock::Single(c.write_encoding_bits()),
            Self::Rgba8(a, c) => {
                let mut out = [0u8; 16];
                out[..8].copy_from_slice(&a.write_encoding_bits());
                out[8..].copy_from_slice(&c.write_encoding_bits());
                EncodedBlock::Dual(out)
            }
            Self::Rgb8A1(c) => EncodedBlock::Single(c.write_encoding_bits()),
        }
    }

    /// Iteration state to carry in a [`super::multipass`] `SortedTile`
    /// record. RG11 packs R's count in the low byte and G's in the high
    /// byte, each with its own done bit. Rgb8/Rgba8/Rgb8A1 report the RGB8
    /// sub-encoder's iteration count directly (A8, when present, is
    /// single-shot and never needs a resume point — see `a8.rs`).
    #[must_use]
    pub fn iteration_state(&self) -> u16 {
        match self {
            Self::R11(r) => r.iteration_state(),
            Self::Rg11(r, g) => (r.iteration_state() & 0xFF) | ((g.iteration_state() & 0xFF) << 8),
            Self::Rgb8(c) => c.iteration_count() as u16,
            Self::Rgba8(_, c) => c.iteration_count() as u16,
            Self::Rgb8A1(c) => c.iteration_count() as u16,
        }
    }

    pub fn decode(
        &mut self,
        bytes: &EncodedBlock,
        tile: &Tile,
        format: Format,
        error_metric: ErrorMetric,
        last_iteration_state: u16,
    ) {
        let is_snorm = format.is_signed();
        let red: Vec<f32> = tile.source.iter().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
        match (self, bytes) {
            (Self::R11(r), EncodedBlock::Single(b)) => {
                r.decode(*b, &red, 4, is_snorm, last_iteration_state);
            }
            (Self::Rg11(r, g), EncodedBlock::Dual(b)) => {
                let mut r_bytes = [0u8; 8];
                let mut g_bytes = [0u8; 8];
                r_bytes.copy_from_slice(&b[..8]);
                g_bytes.copy_from_slice(&b[8..]);
                r.decode(r_bytes, &red, 4, is_snorm, last_iteration_state & 0xFF);
                g.decode(g_bytes, &red[1..], 4, is_snorm, (last_iteration_state >> 8) & 0xFF);
            }
            (Self::Rgb8(c), EncodedBlock::Single(b)) => {
                c.decode(*b, &tile.source, error_metric, last_iteration_state as u8);
            }
            (Self::Rgba8(a, c), EncodedBlock::Dual(b)) => {
                let mut a_bytes = [0u8; 8];
                let mut c_bytes = [0u8; 8];
                a_bytes.copy_from_slice(&b[..8]);
                c_bytes.copy_from_slice(&b[8..]);
                a.decode(a_bytes);
                c.decode(c_bytes, &tile.source, error_metric, last_iteration_state as u8);
            }
            (Self::Rgb8A1(c), EncodedBlock::Single(b)) => {
                c.decode(*b, &tile.source, error_metric, last_iteration_state as u8);
            }
            _ => unreachable!("encoding/bytes shape mismatch"),
        }
    }

    /// Inverse path: decode a previously written block to 16 texels
    /// without mutating any iteration state.
    #[must_use]
    pub fn decode_only(format: Format, bytes: &EncodedBlock) -> [super::tile::Texel; 16] {
        use super::tile::Texel;
        let mut dst = [Texel { r: 0.0, g: 0.0, b: 0.0, a: 1.0 }; 16];
        let is_snorm = format.is_signed();
        match (format, bytes) {
            (Format::R11 | Format::SignedR11, EncodedBlock::Single(b)) => {
                let mut red = [0f32; 64];
                R11Encoder::decode_only(*b, &mut red, 4, is_snorm);
                for i in 0..16 {
                    dst[i].r = red[i * 4];
                }
            }
            (Format::Rg11 | Format::SignedRg11, EncodedBlock::Dual(b)) => {
                let mut r_bytes = [0u8; 8];
                let mut g_bytes = [0u8; 8];
                r_bytes.copy_from_slice(&b[..8]);
                g_bytes.copy_from_slice(&b[8..]);
                let mut red = [0f32; 64];
                let mut green = [0f32; 64];
                R11Encoder::decode_only(r_bytes, &mut red, 4, is_snorm);
                R11Encoder::decode_only(g_bytes, &mut green, 4, is_snorm);
                for i in 0..16 {
                    dst[i].r = red[i * 4];
                    dst[i].g = green[i * 4];
                }
            }
            (Format::Rgb8 | Format::Srgb8 | Format::Etc1 | Format::Rgb8A1 | Format::Srgb8A1, EncodedBlock::Single(b)) => {
                Rgb8Encoder::decode_only(*b, &mut dst);
            }
            (Format::Rgba8 | Format::Srgba8, EncodedBlock::Dual(b)) => {
                let mut a_bytes = [0u8; 8];
                let mut c_bytes = [0u8; 8];
                a_bytes.copy_from_slice(&b[..8]);
                c_bytes.copy_from_slice(&b[8..]);
                Rgb8Encoder::decode_only(c_bytes, &mut dst);
                let mut alpha = [0f32; 64];
                A8Encoder::decode_only(a_bytes, &mut alpha, 4);
                for i in 0..16 {
                    dst[i].a = alpha[i * 4];
                }
            }
            _ => unreachable!("format/bytes shape mismatch"),
        }
        dst
    }
}
