//! Inverse path: expand previously encoded block bytes back into an RGBA8
//! surface.

use crate::block::encoding::{EncodedBlock, Encoding};
use crate::driver::singlepass::{block_columns, block_rows};
use crate::driver::source::RgbaSurface;
use crate::format::{ErrorMetric, Format};

/// Decode a block-compressed buffer into an owned RGBA8 surface. Tiles
/// along the right/bottom edge are clipped to `width`/`height`, so a
/// source whose dimensions aren't multiples of 4 round-trips cleanly.
#[must_use]
pub fn decode_to_rgba8(data: &[u8], width: u32, height: u32, format: Format) -> RgbaSurface {
    let columns = block_columns(width);
    let rows = block_rows(height);
    let block_size = format.bytes_per_block();

    let blank = vec![0u8; (width as usize) * (height as usize) * 4];
    let mut surface = RgbaSurface::from_rgba8(width, height, &blank)
        .with_format(Format::Rgba8)
        .with_error_metric(ErrorMetric::default());

    for y in 0..rows {
        for x in 0..columns {
            let offset = ((y * columns + x) as usize) * block_size;
            let bytes = EncodedBlock::from_bytes(&data[offset..offset + block_size]);
            let texels = Encoding::decode_only(format, &bytes);

            for tx in 0..4u32 {
                for ty in 0..4u32 {
                    let px = x * 4 + tx;
                    let py = y * 4 + ty;
                    if px >= width || py >= height {
                        continue;
                    }
                    // tiles are gathered column-major: source index x*4+y
                    let texel = texels[(tx * 4 + ty) as usize];
                    surface.set_pixel(px, py, texel);
                }
            }
        }
    }

    surface
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::singlepass::encode_singlepass;
    use pretty_assertions::assert_eq;

    #[test]
    fn non_multiple_of_four_dimensions_clip_cleanly() {
        let width = 5;
        let height = 3;
        let data = vec![99u8; (width * height * 4) as usize];
        let surface = RgbaSurface::from_rgba8(width, height, &data).with_format(Format::Rgb8);

        let encoded = encode_singlepass(&surface, Format::Rgb8, ErrorMetric::Rec709, 100.0);
        let decoded = decode_to_rgba8(&encoded, width, height, Format::Rgb8);
        let (w, h, decoded_data) = decoded.into_rgba8();

        assert_eq!(w, width);
        assert_eq!(h, height);
        assert_eq!(decoded_data.len(), (width * height * 4) as usize);
    }
}
