//! Single-pass block encoding: walk every tile once, left to right and top
//! to bottom, refining each with `perform_iteration` until it reports done.

use log::debug;

use crate::block::Block;
use crate::driver::source::SourceImage;
use crate::format::{ErrorMetric, Format};

/// Number of 4x4 block columns needed to cover `width` texels.
#[must_use]
pub fn block_columns(width: u32) -> u32 {
    width.div_ceil(4)
}

/// Number of 4x4 block rows needed to cover `height` texels.
#[must_use]
pub fn block_rows(height: u32) -> u32 {
    height.div_ceil(4)
}

/// Encode every tile of `image` in a single pass. Each tile iterates until
/// its encoder reports done, or exactly once if `effort <= 0.0`.
#[must_use]
pub fn encode_singlepass(image: &dyn SourceImage, format: Format, error_metric: ErrorMetric, effort: f32) -> Vec<u8> {
    let columns = block_columns(image.width());
    let rows = block_rows(image.height());
    let block_size = format.bytes_per_block();
    let mut out = vec![0u8; columns as usize * rows as usize * block_size];

    // One Block is reused for every tile; Block::encode overwrites all of
    // its state before the first iteration, so there's nothing left over
    // from whichever tile ran before it.
    let mut block = Block::new(format, error_metric);
    let mut total_iterations = 0u64;

    for y in 0..rows {
        for x in 0..columns {
            block.encode(image, x * 4, y * 4);

            loop {
                if block.is_done() {
                    break;
                }
                block.perform_iteration(effort);
                total_iterations += 1;

                if effort == 0.0 {
                    break;
                }
            }

            let bytes = block.write_encoding_bits();
            let offset = ((y * columns + x) as usize) * block_size;
            out[offset..offset + block_size].copy_from_slice(bytes.as_bytes());
        }
    }

    debug!("single-pass encode: {total_iterations} total iterations over {} blocks", columns * rows);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::decode::decode_to_rgba8;
    use crate::driver::source::RgbaSurface;
    use pretty_assertions::assert_eq;

    #[test]
    fn block_dimension_rounding() {
        assert_eq!(block_columns(13), 4);
        assert_eq!(block_rows(8), 2);
    }

    #[test]
    fn flat_color_round_trips_through_rgba8() {
        let width = 8;
        let height = 8;
        let mut data = vec![0u8; (width * height * 4) as usize];
        for p in data.chunks_exact_mut(4) {
            p.copy_from_slice(&[200, 40, 40, 255]);
        }
        let surface = RgbaSurface::from_rgba8(width, height, &data).with_format(Format::Rgba8);

        let encoded = encode_singlepass(&surface, Format::Rgba8, ErrorMetric::Rec709, 100.0);
        let decoded = decode_to_rgba8(&encoded, width, height, Format::Rgba8);
        let (_, _, decoded_data) = decoded.into_rgba8();

        for p in decoded_data.chunks_exact(4) {
            assert!((p[0] as i32 - 200).abs() <= 8);
            assert!((p[1] as i32 - 40).abs() <= 8);
            assert!((p[2] as i32 - 40).abs() <= 8);
            assert_eq!(p[3], 255);
        }
    }

    #[test]
    fn zero_effort_runs_exactly_one_iteration_per_tile() {
        let width = 4;
        let height = 4;
        let data = vec![128u8; (width * height * 4) as usize];
        let surface = RgbaSurface::from_rgba8(width, height, &data).with_format(Format::R11);
        let encoded = encode_singlepass(&surface, Format::R11, ErrorMetric::Gray, 0.0);
        assert_eq!(encoded.len(), 8);
    }
}
