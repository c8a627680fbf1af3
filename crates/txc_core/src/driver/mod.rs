//! [`ImageDriver`]: single-pass and multi-pass scheduling of the
//! block-compression engine over a whole image, plus the inverse decode
//! path back to RGBA8.

pub mod decode;
pub mod multipass;
pub mod singlepass;
pub mod source;

use source::{RgbaSurface, SourceImage};

use crate::format::{ErrorMetric, Format};

/// How a texture's tiles are walked and refined.
#[derive(Clone, Copy, Debug)]
pub enum EncodeMode {
    /// One pass over every tile; each tile iterates to completion (or once,
    /// if `effort` is zero).
    SinglePass,
    /// Iterate passes over the whole image, spending extra passes on
    /// whichever tiles still have the worst error, until `block_percent`
    /// percent of tiles finish.
    MultiPass { block_percent: f32 },
}

impl Default for EncodeMode {
    fn default() -> Self {
        Self::MultiPass { block_percent: 100.0 }
    }
}

/// Encodes a [`SourceImage`] to a flat buffer of 4x4 blocks in raster
/// order (row stride `block_columns(width) * format.bytes_per_block()`),
/// and decodes that buffer back to RGBA8.
pub struct ImageDriver;

impl ImageDriver {
    #[must_use]
    pub fn encode(
        image: &dyn SourceImage,
        format: Format,
        error_metric: ErrorMetric,
        mode: EncodeMode,
        effort: f32,
    ) -> Vec<u8> {
        match mode {
            EncodeMode::SinglePass => singlepass::encode_singlepass(image, format, error_metric, effort),
            EncodeMode::MultiPass { block_percent } => {
                multipass::encode_multipass(image, format, error_metric, block_percent, effort)
            }
        }
    }

    #[must_use]
    pub fn decode(data: &[u8], width: u32, height: u32, format: Format) -> RgbaSurface {
        decode::decode_to_rgba8(data, width, height, format)
    }
}
