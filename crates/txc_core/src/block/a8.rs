//! A8 single-channel alpha block encoder, coupled into RGBA8/RGB8A1
//! encoding by [`super::encoding::Encoding`].

use super::bits::{Eac8Bits, MODIFIER_TABLE};
use super::tile::AlphaMix;

const ERROR_TOLERANCE: f32 = 16.0;
const MIN_VALUE_SELECTOR: usize = 3;
const MAX_VALUE_SELECTOR: usize = 7;

fn decode_pixel_alpha(base: i32, multiplier: i32, table: usize, selector: usize) -> i32 {
    (base + multiplier * MODIFIER_TABLE[table][selector]).clamp(0, 255)
}

/// Single-shot search encoder for an 8-byte EAC A8 block.
#[derive(Debug, Default)]
pub struct A8Encoder {
    base: i32,
    multiplier: i32,
    table: u8,
    selectors: [u8; 16],
    done: bool,
}

impl A8Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Reset from 16 source alphas (`source[pixel * stride]`, in
    /// `[0.0, 1.0]`) and the tile's cached alpha-mix classification.
    /// Fast-paths opaque/transparent tiles without running any search.
    pub fn encode(&mut self, _source: &[f32], _stride: usize, alpha_mix: AlphaMix) {
        self.done = false;
        match alpha_mix {
            AlphaMix::Opaque => {
                self.base = 255;
                self.table = 15;
                self.multiplier = 15;
                self.selectors = [7; 16];
                self.done = true;
            }
            AlphaMix::Transparent | AlphaMix::AllZeroAlpha => {
                self.base = 0;
                self.table = 0;
                self.multiplier = 1;
                self.selectors = [0; 16];
                self.done = true;
            }
            _ => {}
        }
    }

    pub fn decode(&mut self, out_bits: [u8; 8]) {
        let bits = Eac8Bits::unpack(out_bits);
        self.base = i32::from(bits.base);
        self.multiplier = i32::from(bits.multiplier);
        self.table = bits.table;
        self.selectors = bits.selectors;
        // A8 never iterates across passes: one call finishes it.
        self.done = true;
    }

    pub fn decode_only(out_bits: [u8; 8], dst: &mut [f32], stride: usize) {
        let bits = Eac8Bits::unpack(out_bits);
        for pixel in 0..16 {
            let decoded = decode_pixel_alpha(
                i32::from(bits.base),
                i32::from(bits.multiplier),
                bits.table as usize,
                bits.selectors[pixel] as usize,
            );
            dst[pixel * stride] = decoded as f32 / 255.0;
        }
    }

    /// One refinement pass: radius widens with effort. A8 always finishes
    /// after its first call (no cross-pass iteration).
    pub fn perform_iteration(&mut self, source: &[f32], stride: usize, effort: f32) {
        if self.done {
            return;
        }
        let radius = if effort < 24.9 {
            0
        } else if effort < 49.9 {
            1
        } else {
            2
        };
        self.calculate(source, stride, radius);
        self.done = true;
    }

    fn calculate(&mut self, source: &[f32], stride: usize, radius: i32) {
        let mut src_alpha = [0i32; 16];
        let mut min_alpha = 255;
        let mut max_alpha = 0;
        for pixel in 0..16 {
            let alpha = (source[pixel * stride] * 255.0).round().clamp(0.0, 255.0) as i32;
            src_alpha[pixel] = alpha;
            min_alpha = min_alpha.min(alpha);
            max_alpha = max_alpha.max(alpha);
        }
        let alpha_range = max_alpha - min_alpha;
        let radius = if alpha_range == 0 { 0 } else { radius };

        let mut error = f32::MAX;

        for table_entry in 0..MODIFIER_TABLE.len() {
            let table_entry_center = -MODIFIER_TABLE[table_entry][MIN_VALUE_SELECTOR];
            let table_entry_range =
                MODIFIER_TABLE[table_entry][MAX_VALUE_SELECTOR] - MODIFIER_TABLE[table_entry][MIN_VALUE_SELECTOR];

            let center_ratio = table_entry_center as f32 / table_entry_range as f32;
            let center_int = (min_alpha as f32 + center_ratio * alpha_range as f32).round() as i32;

            let min_base = (center_int - radius).max(0);
            let max_base = (center_int + radius).min(255);

            let range_multiplier = (alpha_range as f32 / table_entry_range as f32).round() as i32;
            let min_multiplier = (range_multiplier - radius).clamp(1, 15);
            let max_multiplier = (range_multiplier + radius).clamp(1, 15);

            for base in min_base..=max_base {
                for multiplier in min_multiplier..=max_multiplier {
                    let mut best_selectors = [0u8; 16];
                    let mut best_pixel_error = [0i32; 16];
                    for pixel in 0..16 {
                        let mut best = i32::MAX;
                        for selector in 0..8 {
                            let decoded = decode_pixel_alpha(base, multiplier, table_entry, selector);
                            let delta = decoded - src_alpha[pixel];
                            let pixel_error = delta * delta;
                            if pixel_error < best {
                                best = pixel_error;
                                best_selectors[pixel] = selector as u8;
                                best_pixel_error[pixel] = pixel_error;
                            }
                        }
                    }

                    let block_error: i32 = best_pixel_error.iter().sum();
                    if (block_error as f32) < error {
                        error = block_error as f32;
                        self.base = base;
                        self.multiplier = multiplier;
                        self.table = table_entry as u8;
                        self.selectors = best_selectors;

                        if error <= ERROR_TOLERANCE {
                            return;
                        }
                    }
                }
            }
        }
    }

    pub fn write_encoding_bits(&self) -> [u8; 8] {
        Eac8Bits {
            base: self.base as u8,
            table: self.table,
            multiplier: self.multiplier as u8,
            selectors: self.selectors,
        }
        .pack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn opaque_fast_path_bytes() {
        let mut encoder = A8Encoder::new();
        encoder.encode(&[1.0; 64], 4, AlphaMix::Opaque);
        assert!(encoder.is_done());
        assert_eq!(encoder.write_encoding_bits(), [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn transparent_fast_path_bytes() {
        let mut encoder = A8Encoder::new();
        encoder.encode(&[0.0; 64], 4, AlphaMix::Transparent);
        assert!(encoder.is_done());
        assert_eq!(encoder.write_encoding_bits(), [0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn translucent_round_trips_reasonably() {
        let mut source = [0.0f32; 64];
        for pixel in 0..16 {
            source[pixel * 4] = 0.5;
        }
        let mut encoder = A8Encoder::new();
        encoder.encode(&source, 4, AlphaMix::Translucent);
        assert!(!encoder.is_done());
        encoder.perform_iteration(&source, 4, 100.0);
        assert!(encoder.is_done());

        let bits = encoder.write_encoding_bits();
        let mut decoded = [0.0f32; 64];
        A8Encoder::decode_only(bits, &mut decoded, 4);
        for pixel in 0..16 {
            assert!((decoded[pixel * 4] - 0.5).abs() < 0.05);
        }
    }
}
