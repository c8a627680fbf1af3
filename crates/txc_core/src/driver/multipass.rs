//! Multi-pass block encoding: spend extra passes on whichever tiles still
//! have the largest error, stopping once a `block_percent` share of all
//! tiles have reached zero error.
//!
//! This deliberately allows the encoder to stop with some tiles still
//! carrying non-trivial error when content varies a lot across the image;
//! a gradient-heavy texture converges in one pass, a busy one needs many.

use log::debug;

use crate::block::encoding::EncodedBlock;
use crate::block::Block;
use crate::driver::singlepass::{block_columns, block_rows};
use crate::driver::source::SourceImage;
use crate::format::{ErrorMetric, Format};

const MIN_EFFORT_LEVEL: f32 = 0.0;

struct SortedTile {
    src_x: u32,
    src_y: u32,
    iteration_data: u16,
    error: f32,
}

/// Encode every tile of `image`, prioritizing further passes on the
/// highest-error tiles until `block_percent` percent of all tiles finish
/// (or `effort` forbids any pass beyond the first).
#[must_use]
pub fn encode_multipass(
    image: &dyn SourceImage,
    format: Format,
    error_metric: ErrorMetric,
    block_percent: f32,
    effort: f32,
) -> Vec<u8> {
    let columns = block_columns(image.width());
    let rows = block_rows(image.height());
    let block_size = format.bytes_per_block();
    let number_of_blocks = (columns * rows) as usize;
    let mut out = vec![0u8; number_of_blocks * block_size];

    let mut sorted_tiles: Vec<SortedTile> = (0..rows)
        .flat_map(|y| (0..columns).map(move |x| (x, y)))
        .map(|(src_x, src_y)| SortedTile {
            src_x,
            src_y,
            iteration_data: 0,
            error: f32::MAX,
        })
        .collect();

    let mut num_blocks_to_finish = (0.01 * block_percent * number_of_blocks as f32).round() as i64;
    debug!(
        "multi-pass encode: targeting {num_blocks_to_finish}/{number_of_blocks} finished blocks ({block_percent}%)"
    );

    let mut block = Block::new(format, error_metric);
    let mut pass = 0u32;
    let mut total_iterations = 0u64;

    loop {
        for tile in &mut sorted_tiles {
            let offset = ((tile.src_y * columns + tile.src_x) as usize) * block_size;

            if pass == 0 {
                block.encode(image, tile.src_x * 4, tile.src_y * 4);
            } else {
                let prev = EncodedBlock::from_bytes(&out[offset..offset + block_size]);
                block.decode(image, tile.src_x * 4, tile.src_y * 4, &prev, tile.iteration_data);
            }

            block.perform_iteration(effort);
            total_iterations += 1;

            let bytes = block.write_encoding_bits();
            out[offset..offset + block_size].copy_from_slice(bytes.as_bytes());

            tile.iteration_data = block.iteration_state();
            tile.error = if block.is_done() { 0.0 } else { block.error() };

            if tile.error == 0.0 {
                num_blocks_to_finish -= 1;
                // only short-circuit a pass once every block has had at
                // least one full pass
                if pass > 0 && num_blocks_to_finish <= 0 {
                    break;
                }
            }
        }

        if effort <= MIN_EFFORT_LEVEL {
            break;
        }
        if num_blocks_to_finish <= 0 {
            break;
        }

        // largest error first, so the next pass spends its budget there
        sorted_tiles.sort_by(|a, b| b.error.partial_cmp(&a.error).unwrap());

        // drop the trailing run of already-finished tiles
        let trailing_done = sorted_tiles.iter().rev().take_while(|t| t.error == 0.0).count();
        sorted_tiles.truncate(sorted_tiles.len() - trailing_done);

        pass += 1;
    }

    let unfinished = sorted_tiles.iter().filter(|t| t.error > 0.0).count();
    debug!("multi-pass encode: {total_iterations} iterations over {} passes, {unfinished} tiles left unfinished", pass + 1);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::decode::decode_to_rgba8;
    use crate::driver::source::RgbaSurface;
    use pretty_assertions::assert_eq;

    #[test]
    fn flat_color_converges_in_multipass() {
        let width = 8;
        let height = 8;
        let mut data = vec![0u8; (width * height * 4) as usize];
        for p in data.chunks_exact_mut(4) {
            p.copy_from_slice(&[10, 220, 60, 255]);
        }
        let surface = RgbaSurface::from_rgba8(width, height, &data).with_format(Format::Rgba8);

        let encoded = encode_multipass(&surface, Format::Rgba8, ErrorMetric::Rec709, 100.0, 80.0);
        let decoded = decode_to_rgba8(&encoded, width, height, Format::Rgba8);
        let (_, _, decoded_data) = decoded.into_rgba8();

        for p in decoded_data.chunks_exact(4) {
            assert!((p[0] as i32 - 10).abs() <= 8);
            assert!((p[1] as i32 - 220).abs() <= 8);
            assert!((p[2] as i32 - 60).abs() <= 8);
        }
    }

    #[test]
    fn zero_effort_stops_after_first_pass() {
        let width = 4;
        let height = 4;
        let data = vec![64u8; (width * height * 4) as usize];
        let surface = RgbaSurface::from_rgba8(width, height, &data).with_format(Format::Rgb8);
        let encoded = encode_multipass(&surface, Format::Rgb8, ErrorMetric::Rec709, 100.0, 0.0);
        assert_eq!(encoded.len(), 8);
    }
}
