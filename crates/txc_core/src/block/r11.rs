//! R11 (and, via two instances, RG11) single-channel block encoder.

use super::bits::{decode_eac_texel, Eac8Bits, MODIFIER_TABLE, VIRTUAL_SELECTOR_MAP};

/// 16 pixels x 1 unit squared out of 2047 — matches the reference encoder's
/// tolerance for "close enough, stop searching".
const ERROR_TOLERANCE: f32 = 16.0;

/// Iterative search-and-refine encoder for an 8-byte EAC R11 block.
///
/// One instance is reused across many tiles (created once per image by the
/// driver); [`R11Encoder::encode`] resets all per-tile state.
#[derive(Debug, Default)]
pub struct R11Encoder {
    src_pixels: [i32; 16],
    red_min: i32,
    red_max: i32,

    base: i32,
    multiplier: u8,
    table: u8,
    selectors: [u8; 16],

    is_snorm: bool,
    iteration: u32,
    error: f32,
    done: bool,
    active: bool,
}

impl R11Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub fn error(&self) -> f32 {
        self.error
    }

    #[must_use]
    pub fn iteration_count(&self) -> u32 {
        self.iteration
    }

    /// Reset iteration state from 16 source values in `[0.0, 1.0]` (channel
    /// stride `stride`, e.g. 4 for an interleaved RGBA buffer). Does not
    /// perform the first iteration.
    pub fn encode(&mut self, source: &[f32], stride: usize, is_snorm: bool) {
        let mut min = 2047;
        let mut max = 0;
        for pixel in 0..16 {
            let value = (source[pixel * stride] * 2047.0).round().clamp(0.0, 2047.0) as i32;
            self.src_pixels[pixel] = value;
            min = min.min(value);
            max = max.max(value);
        }
        self.red_min = min;
        self.red_max = max;

        self.iteration = 0;
        self.error = f32::MAX;
        self.done = false;
        self.is_snorm = is_snorm;
        self.active = true;
    }

    /// Resume from a previously written block and a carried iteration
    /// count (with "done" in the high bit). Returns `true` if the encoder
    /// is now ready for further `perform_iteration` calls; `false` means
    /// the block was already done and `out_bits` was left untouched.
    pub fn decode(
        &mut self,
        out_bits: [u8; 8],
        source: &[f32],
        stride: usize,
        is_snorm: bool,
        last_iteration_count: u16,
    ) -> bool {
        self.done = (last_iteration_count & 0x80) != 0;
        if self.done {
            self.active = false;
            self.error = 0.0;
            return false;
        }

        self.iteration = u32::from(last_iteration_count);

        let bits = Eac8Bits::unpack(out_bits);
        self.base = if is_snorm {
            i32::from(bits.base as i8) + 128
        } else {
            i32::from(bits.base)
        };
        self.multiplier = bits.multiplier;
        self.table = bits.table;
        self.selectors = bits.selectors;

        // re-establish per-tile source state but keep the resumed iteration
        // counter (a fresh `encode` would reset it to 0).
        let resume_iteration = self.iteration;
        self.encode(source, stride, is_snorm);
        self.iteration = resume_iteration;

        self.error = self.recompute_error();
        true
    }

    /// Decode a previously written block to 16 texels in `[0.0, 1.0]`
    /// without touching any iteration state.
    pub fn decode_only(out_bits: [u8; 8], dst: &mut [f32], stride: usize, is_snorm: bool) {
        let bits = Eac8Bits::unpack(out_bits);
        let base = if is_snorm {
            i32::from(bits.base as i8) + 128
        } else {
            i32::from(bits.base)
        };
        let multiplier_effective = if bits.multiplier == 0 {
            1
        } else {
            8 * i32::from(bits.multiplier)
        };
        let base_mul8_plus4 = base * 8 + 4;

        for pixel in 0..16 {
            let modifier = MODIFIER_TABLE[bits.table as usize][bits.selectors[pixel] as usize];
            let decoded = decode_eac_texel(base_mul8_plus4, multiplier_effective, modifier, 2047);
            dst[pixel * stride] = decoded as f32 / 2047.0;
        }
    }

    fn recompute_error(&self) -> f32 {
        let multiplier_effective = if self.multiplier == 0 {
            1
        } else {
            8 * i32::from(self.multiplier)
        };
        let base_mul8_plus4 = self.base * 8 + 4;
        let mut block_error = 0i64;
        for pixel in 0..16 {
            let modifier = MODIFIER_TABLE[self.table as usize][self.selectors[pixel] as usize];
            let decoded = decode_eac_texel(base_mul8_plus4, multiplier_effective, modifier, 2047);
            let delta = i64::from(decoded - self.src_pixels[pixel]);
            block_error += delta * delta;
        }
        block_error as f32
    }

    /// One unit of refinement. `effort` scales how widely later stages
    /// search; idempotent once [`Self::is_done`] is true.
    pub fn perform_iteration(&mut self, effort: f32) {
        if !self.active || self.done {
            return;
        }

        match self.iteration {
            0 => self.calculate(8, 0, 0),
            1 => {
                self.calculate(8, 2, 1);
                if effort <= 24.5 {
                    self.done = true;
                }
            }
            2 => {
                self.calculate(8, 12, 1);
                if effort <= 49.5 {
                    self.done = true;
                }
            }
            3 => self.calculate(7, 6, 1),
            4 => self.calculate(6, 3, 1),
            _ => {
                self.calculate(5, 1, 0);
                self.done = true;
            }
        }

        if !self.done {
            if self.error < ERROR_TOLERANCE {
                self.done = true;
            } else {
                self.iteration += 1;
            }
        }
    }

    /// Brute-force search over (modifier table, selector window, base,
    /// multiplier) for the combination that minimizes block error.
    fn calculate(&mut self, selectors_used: u32, base_radius: i32, multiplier_radius: i32) {
        let mut base_radius = base_radius;
        let mut multiplier_radius = multiplier_radius;
        let red_range = self.red_max - self.red_min;
        if red_range == 0 {
            base_radius = 0;
            multiplier_radius = 0;
        }

        for table_entry in 0..MODIFIER_TABLE.len() {
            let max_min_virtual = 8 - selectors_used as i32;
            for min_virtual in 0..=max_min_virtual {
                let max_virtual = min_virtual + selectors_used as i32 - 1;
                let min_selector = VIRTUAL_SELECTOR_MAP[min_virtual as usize] as usize;
                let max_selector = VIRTUAL_SELECTOR_MAP[max_virtual as usize] as usize;

                let table_entry_center = -MODIFIER_TABLE[table_entry][min_selector];
                let table_entry_range =
                    MODIFIER_TABLE[table_entry][max_selector] - MODIFIER_TABLE[table_entry][min_selector];

                let center_ratio = table_entry_center as f32 / table_entry_range as f32;
                let center = self.red_min as f32 + center_ratio * red_range as f32;
                let center_int = ((255.0 / 2047.0) * center).round() as i32;

                let min_base = (center_int - base_radius).max(0);
                let max_base = (center_int + base_radius).min(255);

                let range_multiplier =
                    ((red_range as f32 * (255.0 / 2047.0)) / table_entry_range as f32).round() as i32;
                let min_multiplier = (range_multiplier - multiplier_radius).clamp(0, 15);
                let max_multiplier = (range_multiplier + multiplier_radius).clamp(1, 15);

                for base in min_base..=max_base {
                    let base_for_decode = base * 8 + 4;
                    for multiplier in min_multiplier..=max_multiplier {
                        let multiplier_for_decode = if multiplier == 0 { 1 } else { 8 * multiplier };

                        let mut best_selectors = [0u8; 16];
                        let mut best_pixel_error = [0i32; 16];
                        for pixel in 0..16 {
                            let mut best = i32::MAX;
                            for selector in 0..8 {
                                let modifier = MODIFIER_TABLE[table_entry][selector];
                                let decoded =
                                    decode_eac_texel(base_for_decode, multiplier_for_decode, modifier, 2047);
                                let delta = decoded - self.src_pixels[pixel];
                                let error = delta * delta;
                                if error < best {
                                    best = error;
                                    best_pixel_error[pixel] = error;
                                    best_selectors[pixel] = selector as u8;
                                }
                            }
                        }

                        let block_error: i32 = best_pixel_error.iter().sum();
                        if (block_error as f32) < self.error {
                            self.base = if self.is_snorm { base - 128 } else { base };
                            self.multiplier = multiplier as u8;
                            self.table = table_entry as u8;
                            self.selectors = best_selectors;
                            self.error = block_error as f32;

                            if self.error <= ERROR_TOLERANCE {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    /// Serialize the current best candidate into an 8-byte output block.
    /// Idempotent. Must not be called while the encoder has no active
    /// state (i.e. immediately after a `decode` that returned `false`).
    pub fn write_encoding_bits(&self) -> [u8; 8] {
        let base_byte = if self.is_snorm {
            self.base as i8 as u8
        } else {
            self.base as u8
        };
        Eac8Bits {
            base: base_byte,
            table: self.table,
            multiplier: self.multiplier,
            selectors: self.selectors,
        }
        .pack()
    }

    /// Iteration count with the "done" bit folded in, for carrying across
    /// multi-pass scheduling.
    #[must_use]
    pub fn iteration_state(&self) -> u16 {
        let mut state = (self.iteration as u16) & 0x7F;
        if self.done {
            state |= 0x80;
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run_to_done(encoder: &mut R11Encoder, effort: f32) {
        while !encoder.is_done() {
            encoder.perform_iteration(effort);
        }
    }

    #[test]
    fn constant_red_round_trips() {
        let source = [0.5f32; 64];
        let mut encoder = R11Encoder::new();
        encoder.encode(&source, 4, false);
        run_to_done(&mut encoder, 100.0);
        let bits = encoder.write_encoding_bits();

        let mut decoded = [0.0f32; 64];
        R11Encoder::decode_only(bits, &mut decoded, 4, false);
        for pixel in 0..16 {
            assert!((decoded[pixel * 4] - 0.5).abs() < 0.02);
        }
    }

    #[test]
    fn error_is_monotonically_non_increasing() {
        let mut source = [0.0f32; 64];
        for pixel in 0..16 {
            source[pixel * 4] = pixel as f32 / 15.0;
        }
        let mut encoder = R11Encoder::new();
        encoder.encode(&source, 4, false);
        let mut last = f32::MAX;
        while !encoder.is_done() {
            encoder.perform_iteration(100.0);
            assert!(encoder.error() <= last);
            last = encoder.error();
        }
    }

    #[test]
    fn effort_zero_runs_one_iteration_per_call() {
        let source = [0.3f32; 64];
        let mut encoder = R11Encoder::new();
        encoder.encode(&source, 4, false);
        encoder.perform_iteration(0.0);
        assert_eq!(encoder.iteration_count(), 1);
    }

    #[test]
    fn resume_after_done_leaves_state_untouched() {
        let source = [0.75f32; 64];
        let mut encoder = R11Encoder::new();
        encoder.encode(&source, 4, false);
        run_to_done(&mut encoder, 100.0);
        let bits = encoder.write_encoding_bits();
        let iteration_state = encoder.iteration_state();

        let mut resumed = R11Encoder::new();
        let active = resumed.decode(bits, &source, 4, false, iteration_state);
        assert!(!active);
        assert!(resumed.is_done());
        assert_eq!(resumed.error(), 0.0);
    }
}
