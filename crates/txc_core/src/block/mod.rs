//! The block-compression engine: per-tile encoders (R11/A8/RGB8) and the
//! shared [`Block`] state that ties a gathered [`tile::Tile`] to exactly
//! one [`encoding::Encoding`].

pub mod a8;
pub mod bits;
pub mod encoding;
pub mod r11;
pub mod rgb8;
pub mod tile;

use encoding::{EncodedBlock, Encoding};
use tile::Tile;

use crate::driver::source::SourceImage;
use crate::format::{ErrorMetric, Format};

/// Owns the per-tile state machine: the gathered source pixels and exactly
/// one encoder, matching the image's format. Reused across many tiles by
/// the driver to avoid per-tile heap traffic; every call to
/// [`Block::encode`]/[`Block::decode`] unconditionally overwrites all
/// fields first, so no state can leak from whatever tile was processed
/// before it.
pub struct Block {
    format: Format,
    error_metric: ErrorMetric,
    tile: Tile,
    encoding: Encoding,
}

impl Block {
    #[must_use]
    pub fn new(format: Format, error_metric: ErrorMetric) -> Self {
        Self {
            format,
            error_metric,
            tile: Tile {
                source: [tile::Texel::default(); 16],
                origin_x: 0,
                origin_y: 0,
                alpha_mix: tile::AlphaMix::Unknown,
                has_color: false,
                has_punch_through: false,
            },
            encoding: Encoding::new(format),
        }
    }

    pub fn encode(&mut self, image: &dyn SourceImage, origin_x: u32, origin_y: u32) {
        self.tile = Tile::gather(image, origin_x, origin_y, self.format);
        self.encoding = Encoding::new(self.format);
        self.encoding.encode(&self.tile, self.format, self.error_metric);
    }

    pub fn decode(
        &mut self,
        image: &dyn SourceImage,
        origin_x: u32,
        origin_y: u32,
        bytes: &EncodedBlock,
        last_iteration_state: u16,
    ) {
        self.tile = Tile::gather(image, origin_x, origin_y, self.format);
        self.encoding = Encoding::new(self.format);
        self.encoding
            .decode(bytes, &self.tile, self.format, self.error_metric, last_iteration_state);
    }

    pub fn perform_iteration(&mut self, effort: f32) {
        self.encoding.perform_iteration(&self.tile, effort);
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.encoding.is_done()
    }

    #[must_use]
    pub fn error(&self) -> f32 {
        self.encoding.error()
    }

    #[must_use]
    pub fn iteration_state(&self) -> u16 {
        self.encoding.iteration_state()
    }

    #[must_use]
    pub fn write_encoding_bits(&self) -> EncodedBlock {
        self.encoding.write_encoding_bits()
    }

    #[must_use]
    pub fn alpha_mix(&self) -> tile::AlphaMix {
        self.tile.alpha_mix
    }

    #[must_use]
    pub fn has_color(&self) -> bool {
        self.tile.has_color
    }
}
