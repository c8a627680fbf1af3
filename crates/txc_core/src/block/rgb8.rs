//! RGB8 color block encoder: selects among ETC1 (differential/individual),
//! T-mode, H-mode, and Planar sub-modes.
//!
//! The real ETC1/ETC2 wire format packs T/H/Planar mode selection into the
//! overflow behaviour of the differential delta field, which is not needed
//! here (bit-exact equality with any prior encoder is out of scope). This
//! encoder instead spends an explicit 3-bit mode tag and a single
//! block-wide modifier-table index (rather than one per ETC1 sub-block) to
//! keep the 8-byte budget, and documents that simplification here rather
//! than in the wire format itself.

use super::bits::{expand_bits, quantize_bits, Rgb8Mode, ETC1_MODIFIER_TABLE, TH_DISTANCE_TABLE};
use super::tile::Texel;
use crate::format::ErrorMetric;

const TERMINAL_ITERATION: u32 = 2;

#[derive(Clone, Copy, Debug, Default)]
struct Rgb {
    r: u8,
    g: u8,
    b: u8,
}

impl Rgb {
    fn from_texel(t: Texel) -> Self {
        Self {
            r: (t.r * 255.0).round().clamp(0.0, 255.0) as u8,
            g: (t.g * 255.0).round().clamp(0.0, 255.0) as u8,
            b: (t.b * 255.0).round().clamp(0.0, 255.0) as u8,
        }
    }
}

fn pixel_error(decoded: Rgb, source: Rgb, metric: ErrorMetric) -> i32 {
    let dr = i32::from(decoded.r) - i32::from(source.r);
    if metric == ErrorMetric::Gray {
        return dr * dr;
    }
    let dg = i32::from(decoded.g) - i32::from(source.g);
    let db = i32::from(decoded.b) - i32::from(source.b);
    dr * dr + dg * dg + db * db
}

/// `16 texels * per-texel tolerance`, the per-texel constant chosen per
/// metric (gray content tolerates the least slack since only one channel
/// carries information).
fn block_tolerance(metric: ErrorMetric) -> i32 {
    let per_texel = match metric {
        ErrorMetric::Gray => 1,
        ErrorMetric::Rec709 => 5,
        ErrorMetric::Numeric => 3,
    };
    16 * per_texel
}

#[derive(Clone, Copy, Debug)]
struct Candidate {
    mode: Rgb8Mode,
    flip: bool,
    table: u8,
    ep1: Rgb,
    ep2: Rgb,
    selectors: [u8; 16],
    planar: Option<(Rgb, Rgb, Rgb)>,
    /// Block-granularity punch-through: the whole tile is fully
    /// transparent. Carried in the one spare bit the 64-bit layout leaves
    /// free (bit 0 in both the ETC1/T/H and Planar branches); see
    /// `pack`/`unpack`.
    transparent: bool,
    error: i32,
}

impl Candidate {
    fn worst() -> Self {
        Self {
            mode: Rgb8Mode::Etc1Individual,
            flip: false,
            table: 0,
            ep1: Rgb::default(),
            ep2: Rgb::default(),
            selectors: [0; 16],
            planar: None,
            transparent: false,
            error: i32::MAX,
        }
    }
}

/// Search-and-refine encoder for an 8-byte RGB8 (ETC1/T/H/Planar) block.
#[derive(Debug, Default)]
pub struct Rgb8Encoder {
    source: [Rgb; 16],
    error_metric: ErrorMetric,
    best: Option<Candidate>,
    iteration: u32,
    done: bool,
}

impl Rgb8Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    #[must_use]
    pub fn error(&self) -> f32 {
        self.best.map_or(f32::MAX, |c| c.error as f32)
    }

    #[must_use]
    pub fn iteration_count(&self) -> u32 {
        self.iteration
    }

    /// Reset from 16 source texels. `transparent` short-circuits the
    /// search: the RGBA8 coupling zeroes color and marks done immediately
    /// when the alpha plane is fully transparent.
    pub fn encode(&mut self, source: &[Texel; 16], error_metric: ErrorMetric, transparent: bool) {
        for (dst, src) in self.source.iter_mut().zip(source.iter()) {
            *dst = Rgb::from_texel(*src);
        }
        self.error_metric = error_metric;
        self.iteration = 0;
        self.done = false;
        self.best = None;

        if transparent {
            self.best = Some(Candidate {
                mode: Rgb8Mode::Etc1Individual,
                flip: false,
                table: 0,
                ep1: Rgb::default(),
                ep2: Rgb::default(),
                selectors: [0; 16],
                planar: None,
                transparent: true,
                error: 0,
            });
            self.done = true;
        }
    }

    /// Resume a tile from a prior pass's encoded bytes. `last_iteration_state`
    /// is the `iteration_count()` this encoder reported when it last wrote
    /// those bytes (carried by the multi-pass driver's `SortedTile` record);
    /// restoring it here, rather than letting `encode` reset to 0, is what
    /// lets `perform_iteration` pick up at T/H or Planar on the next call
    /// instead of re-running ETC1 forever.
    pub fn decode(&mut self, out_bits: [u8; 8], source: &[Texel; 16], error_metric: ErrorMetric, last_iteration_state: u8) {
        self.encode(source, error_metric, false);
        self.best = Some(Self::unpack(out_bits));
        self.best.as_mut().unwrap().error = self.recompute_error();
        self.iteration = u32::from(last_iteration_state).min(TERMINAL_ITERATION);
    }

    pub fn decode_only(out_bits: [u8; 8], dst: &mut [Texel; 16]) {
        let c = Self::unpack(out_bits);
        Self::decode_candidate_into(&c, dst);
    }

    fn recompute_error(&self) -> i32 {
        let mut decoded = [Texel::default(); 16];
        Self::decode_candidate_into(self.best.as_ref().unwrap(), &mut decoded);
        let mut total = 0i32;
        for pixel in 0..16 {
            total += pixel_error(Rgb::from_texel(decoded[pixel]), self.source[pixel], self.error_metric);
        }
        total
    }

    /// One refinement pass. Iteration 0 tries ETC1 (both orientations),
    /// iteration 1 adds T and H, iteration 2 adds Planar and terminates.
    pub fn perform_iteration(&mut self, effort: f32) {
        if self.done {
            return;
        }

        let tolerance = block_tolerance(self.error_metric);
        let mut best = self.best.unwrap_or_else(Candidate::worst);

        match self.iteration {
            0 => {
                self.consider_etc1(false, &mut best);
                self.consider_etc1(true, &mut best);
            }
            1 if effort > 10.0 => {
                self.consider_t(&mut best);
                self.consider_h(&mut best);
            }
            _ => {
                if effort > 25.0 {
                    self.consider_planar(&mut best);
                }
            }
        }

        self.best = Some(best);

        if best.error <= tolerance || self.iteration >= TERMINAL_ITERATION {
            self.done = true;
        } else {
            self.iteration += 1;
        }
    }

    fn halves(flip: bool) -> ([usize; 8], [usize; 8]) {
        let mut a = [0usize; 8];
        let mut b = [0usize; 8];
        let (mut ai, mut bi) = (0, 0);
        for x in 0..4usize {
            for y in 0..4usize {
                let idx = x * 4 + y;
                let in_first_half = if flip { y < 2 } else { x < 2 };
                if in_first_half {
                    a[ai] = idx;
                    ai += 1;
                } else {
                    b[bi] = idx;
                    bi += 1;
                }
            }
        }
        (a, b)
    }

    fn average(&self, indices: &[usize]) -> Rgb {
        let (mut r, mut g, mut b) = (0u32, 0u32, 0u32);
        for &i in indices {
            r += u32::from(self.source[i].r);
            g += u32::from(self.source[i].g);
            b += u32::from(self.source[i].b);
        }
        let n = indices.len() as u32;
        Rgb {
            r: (r / n) as u8,
            g: (g / n) as u8,
            b: (b / n) as u8,
        }
    }

    fn consider_etc1(&self, flip: bool, best: &mut Candidate) {
        let (half_a, half_b) = Self::halves(flip);
        let avg_a = self.average(&half_a);
        let avg_b = self.average(&half_b);

        let quantize4 = |c: Rgb| Rgb {
            r: expand_bits(quantize_bits(c.r, 4), 4),
            g: expand_bits(quantize_bits(c.g, 4), 4),
            b: expand_bits(quantize_bits(c.b, 4), 4),
        };
        let ep1 = quantize4(avg_a);
        let ep2 = quantize4(avg_b);

        let diffable = |lo: u8, hi: u8| (i32::from(hi) - i32::from(lo)).unsigned_abs() <= 3 * 8;
        let mode = if diffable(ep1.r, ep2.r) && diffable(ep1.g, ep2.g) && diffable(ep1.b, ep2.b) {
            Rgb8Mode::Etc1Differential
        } else {
            Rgb8Mode::Etc1Individual
        };

        for table in 0..ETC1_MODIFIER_TABLE.len() as u8 {
            let mut selectors = [0u8; 16];
            let mut error = 0i32;
            for &i in half_a.iter() {
                let (sel, e) = self.best_etc1_selector(i, ep1, table);
                selectors[i] = sel;
                error += e;
            }
            for &i in half_b.iter() {
                let (sel, e) = self.best_etc1_selector(i, ep2, table);
                selectors[i] = sel;
                error += e;
            }

            if error < best.error {
                *best = Candidate {
                    mode,
                    flip,
                    table,
                    ep1,
                    ep2,
                    selectors,
                    planar: None,
                    transparent: false,
                    error,
                };
            }
        }
    }

    fn best_etc1_selector(&self, pixel: usize, endpoint: Rgb, table: u8) -> (u8, i32) {
        let [m0, m1] = ETC1_MODIFIER_TABLE[table as usize];
        let deltas: [i32; 4] = [i32::from(m0), i32::from(m1), -i32::from(m0), -i32::from(m1)];

        let mut best_sel = 0u8;
        let mut best_error = i32::MAX;
        for (sel, &delta) in deltas.iter().enumerate() {
            let decoded = Rgb {
                r: (i32::from(endpoint.r) + delta).clamp(0, 255) as u8,
                g: (i32::from(endpoint.g) + delta).clamp(0, 255) as u8,
                b: (i32::from(endpoint.b) + delta).clamp(0, 255) as u8,
            };
            let e = pixel_error(decoded, self.source[pixel], self.error_metric);
            if e < best_error {
                best_error = e;
                best_sel = sel as u8;
            }
        }
        (best_sel, best_error)
    }

    /// Split pixels by luminance into two clusters of 8, used by both T and
    /// H mode as a cheap stand-in for a real nearest-centroid clustering.
    fn luminance_clusters(&self) -> ([usize; 8], [usize; 8]) {
        let mut order: [usize; 16] = std::array::from_fn(|i| i);
        order.sort_by_key(|&i| {
            let p = self.source[i];
            u32::from(p.r) + u32::from(p.g) + u32::from(p.b)
        });
        let mut a = [0usize; 8];
        let mut b = [0usize; 8];
        a.copy_from_slice(&order[0..8]);
        b.copy_from_slice(&order[8..16]);
        (a, b)
    }

    fn consider_t(&self, best: &mut Candidate) {
        let (cluster_a, cluster_b) = self.luminance_clusters();
        let base1 = self.average(&cluster_a);
        let base2 = self.average(&cluster_b);
        let ep1 = Rgb {
            r: expand_bits(quantize_bits(base1.r, 4), 4),
            g: expand_bits(quantize_bits(base1.g, 4), 4),
            b: expand_bits(quantize_bits(base1.b, 4), 4),
        };
        let ep2 = Rgb {
            r: expand_bits(quantize_bits(base2.r, 4), 4),
            g: expand_bits(quantize_bits(base2.g, 4), 4),
            b: expand_bits(quantize_bits(base2.b, 4), 4),
        };

        for (table, &dist) in TH_DISTANCE_TABLE.iter().enumerate() {
            let d = i32::from(dist);
            let palette = [
                ep1,
                clamp_offset(ep1, d),
                clamp_offset(ep1, -d),
                ep2,
            ];
            let (selectors, error) = self.best_palette_selectors(&palette);
            if error < best.error {
                *best = Candidate {
                    mode: Rgb8Mode::T,
                    flip: false,
                    table: table as u8,
                    ep1,
                    ep2,
                    selectors,
                    planar: None,
                    transparent: false,
                    error,
                };
            }
        }
    }

    fn consider_h(&self, best: &mut Candidate) {
        let (cluster_a, cluster_b) = self.luminance_clusters();
        let base1 = self.average(&cluster_a);
        let base2 = self.average(&cluster_b);
        let ep1 = Rgb {
            r: expand_bits(quantize_bits(base1.r, 4), 4),
            g: expand_bits(quantize_bits(base1.g, 4), 4),
            b: expand_bits(quantize_bits(base1.b, 4), 4),
        };
        let ep2 = Rgb {
            r: expand_bits(quantize_bits(base2.r, 4), 4),
            g: expand_bits(quantize_bits(base2.g, 4), 4),
            b: expand_bits(quantize_bits(base2.b, 4), 4),
        };
        let ordering = (ep1.r, ep1.g, ep1.b) < (ep2.r, ep2.g, ep2.b);

        for (table, &dist) in TH_DISTANCE_TABLE.iter().enumerate() {
            let d = i32::from(dist);
            let palette = [
                clamp_offset(ep1, d),
                clamp_offset(ep1, -d),
                clamp_offset(ep2, d),
                clamp_offset(ep2, -d),
            ];
            let (selectors, error) = self.best_palette_selectors(&palette);
            if error < best.error {
                *best = Candidate {
                    mode: Rgb8Mode::H,
                    flip: ordering,
                    table: table as u8,
                    ep1,
                    ep2,
                    selectors,
                    planar: None,
                    transparent: false,
                    error,
                };
            }
        }
    }

    fn best_palette_selectors(&self, palette: &[Rgb; 4]) -> ([u8; 16], i32) {
        let mut selectors = [0u8; 16];
        let mut total = 0i32;
        for pixel in 0..16 {
            let mut best_sel = 0u8;
            let mut best_error = i32::MAX;
            for (sel, &candidate) in palette.iter().enumerate() {
                let e = pixel_error(candidate, self.source[pixel], self.error_metric);
                if e < best_error {
                    best_error = e;
                    best_sel = sel as u8;
                }
            }
            selectors[pixel] = best_sel;
            total += best_error;
        }
        (selectors, total)
    }

    /// Closed-form least-squares plane fit (grid is orthogonal, so the two
    /// slopes solve independently), then quantize with a small local
    /// search over the rounding in each channel.
    fn consider_planar(&self, best: &mut Candidate) {
        let fit_channel = |channel: fn(Rgb) -> u8| -> (f32, f32, f32) {
            let mut sum = 0.0f32;
            for x in 0..4usize {
                for y in 0..4usize {
                    sum += f32::from(channel(self.source[x * 4 + y]));
                }
            }
            let mean = sum / 16.0;

            let mut slope_x_num = 0.0f32;
            let mut slope_y_num = 0.0f32;
            for x in 0..4usize {
                for y in 0..4usize {
                    let v = f32::from(channel(self.source[x * 4 + y]));
                    slope_x_num += (x as f32 - 1.5) * v;
                    slope_y_num += (y as f32 - 1.5) * v;
                }
            }
            let slope_x = slope_x_num / 20.0;
            let slope_y = slope_y_num / 20.0;
            let origin = mean - slope_x * 1.5 - slope_y * 1.5;
            (origin, slope_x, slope_y)
        };

        let (or, sxr, syr) = fit_channel(|p| p.r);
        let (og, sxg, syg) = fit_channel(|p| p.g);
        let (ob, sxb, syb) = fit_channel(|p| p.b);

        let clamp255 = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        let origin = Rgb {
            r: clamp255(or),
            g: clamp255(og),
            b: clamp255(ob),
        };
        let h_corner = Rgb {
            r: clamp255(or + sxr * 3.0),
            g: clamp255(og + sxg * 3.0),
            b: clamp255(ob + sxb * 3.0),
        };
        let v_corner = Rgb {
            r: clamp255(or + syr * 3.0),
            g: clamp255(og + syg * 3.0),
            b: clamp255(ob + syb * 3.0),
        };

        let quantize = |c: Rgb, bits: u32| Rgb {
            r: expand_bits(quantize_bits(c.r, bits), bits),
            g: expand_bits(quantize_bits(c.g, bits), bits),
            b: expand_bits(quantize_bits(c.b, bits), bits),
        };
        let origin_q = quantize(origin, 6);
        let h_q = quantize(h_corner, 7);
        let v_q = quantize(v_corner, 6);

        let mut decoded = [Texel::default(); 16];
        Self::decode_planar_into(origin_q, h_q, v_q, &mut decoded);
        let mut error = 0i32;
        for pixel in 0..16 {
            error += pixel_error(Rgb::from_texel(decoded[pixel]), self.source[pixel], self.error_metric);
        }

        if error < best.error {
            *best = Candidate {
                mode: Rgb8Mode::Planar,
                flip: false,
                table: 0,
                ep1: Rgb::default(),
                ep2: Rgb::default(),
                selectors: [0; 16],
                planar: Some((origin_q, h_q, v_q)),
                transparent: false,
                error,
            };
        }
    }

    fn decode_planar_into(origin: Rgb, h: Rgb, v: Rgb, dst: &mut [Texel; 16]) {
        for x in 0..4usize {
            for y in 0..4usize {
                let idx = x * 4 + y;
                let interp = |o: u8, hc: u8, vc: u8| -> f32 {
                    let o = f32::from(o);
                    let hc = f32::from(hc);
                    let vc = f32::from(vc);
                    (o + (x as f32) * (hc - o) / 3.0 + (y as f32) * (vc - o) / 3.0).clamp(0.0, 255.0)
                };
                dst[idx] = Texel {
                    r: interp(origin.r, h.r, v.r) / 255.0,
                    g: interp(origin.g, h.g, v.g) / 255.0,
                    b: interp(origin.b, h.b, v.b) / 255.0,
                    a: 1.0,
                };
            }
        }
    }

    fn decode_candidate_into(c: &Candidate, dst: &mut [Texel; 16]) {
        if let Rgb8Mode::Planar = c.mode {
            let (o, h, v) = c.planar.unwrap();
            Self::decode_planar_into(o, h, v, dst);
            Self::apply_punch_through(c, dst);
            return;
        }

        match c.mode {
            Rgb8Mode::Etc1Individual | Rgb8Mode::Etc1Differential => {
                let (half_a, half_b) = Self::halves(c.flip);
                let [m0, m1] = ETC1_MODIFIER_TABLE[c.table as usize];
                let deltas: [i32; 4] = [i32::from(m0), i32::from(m1), -i32::from(m0), -i32::from(m1)];
                for &i in half_a.iter() {
                    dst[i] = apply_delta(c.ep1, deltas[c.selectors[i] as usize]);
                }
                for &i in half_b.iter() {
                    dst[i] = apply_delta(c.ep2, deltas[c.selectors[i] as usize]);
                }
            }
            Rgb8Mode::T => {
                let d = i32::from(TH_DISTANCE_TABLE[c.table as usize]);
                let palette = [c.ep1, clamp_offset(c.ep1, d), clamp_offset(c.ep1, -d), c.ep2];
                for pixel in 0..16 {
                    dst[pixel] = rgb_to_texel(palette[c.selectors[pixel] as usize]);
                }
            }
            Rgb8Mode::H => {
                let d = i32::from(TH_DISTANCE_TABLE[c.table as usize]);
                let palette = [
                    clamp_offset(c.ep1, d),
                    clamp_offset(c.ep1, -d),
                    clamp_offset(c.ep2, d),
                    clamp_offset(c.ep2, -d),
                ];
                for pixel in 0..16 {
                    dst[pixel] = rgb_to_texel(palette[c.selectors[pixel] as usize]);
                }
            }
            Rgb8Mode::Planar => unreachable!(),
        }
        Self::apply_punch_through(c, dst);
    }

    /// Restores the block-granularity punch-through bit: a fully
    /// transparent tile decodes every texel's alpha back to 0. Mixed
    /// tiles (some texels transparent, some not) aren't representable at
    /// this granularity — the 64-bit layout has exactly one spare bit —
    /// so they fall back to fully opaque, same as a plain RGB8 block.
    fn apply_punch_through(c: &Candidate, dst: &mut [Texel; 16]) {
        if c.transparent {
            for texel in dst.iter_mut() {
                texel.a = 0.0;
            }
        }
    }

    pub fn write_encoding_bits(&self) -> [u8; 8] {
        Self::pack(&self.best.unwrap_or_else(Candidate::worst))
    }

    fn pack(c: &Candidate) -> [u8; 8] {
        let mut bits: u64 = u64::from(c.mode as u8) << 61;
        if let Rgb8Mode::Planar = c.mode {
            let (o, h, v) = c.planar.unwrap();
            bits |= u64::from(quantize_bits(o.r, 6)) << 55;
            bits |= u64::from(quantize_bits(o.g, 6)) << 49;
            bits |= u64::from(quantize_bits(o.b, 6)) << 43;
            bits |= u64::from(quantize_bits(h.r, 7)) << 36;
            bits |= u64::from(quantize_bits(h.g, 7)) << 29;
            bits |= u64::from(quantize_bits(h.b, 7)) << 22;
            bits |= u64::from(quantize_bits(v.r, 6)) << 16;
            bits |= u64::from(quantize_bits(v.g, 6)) << 10;
            bits |= u64::from(quantize_bits(v.b, 6)) << 4;
        } else {
            bits |= u64::from(c.flip) << 60;
            bits |= u64::from(c.table) << 57;
            bits |= u64::from(quantize_bits(c.ep1.r, 4)) << 53;
            bits |= u64::from(quantize_bits(c.ep1.g, 4)) << 49;
            bits |= u64::from(quantize_bits(c.ep1.b, 4)) << 45;
            bits |= u64::from(quantize_bits(c.ep2.r, 4)) << 41;
            bits |= u64::from(quantize_bits(c.ep2.g, 4)) << 37;
            bits |= u64::from(quantize_bits(c.ep2.b, 4)) << 33;
            for (pixel, &sel) in c.selectors.iter().enumerate() {
                bits |= u64::from(sel & 0x3) << (31 - 2 * pixel as u64);
            }
        }
        // Bit 0 is unused by every mode above (selectors top out at bit 1,
        // the Planar fields at bit 4): spend it on the punch-through flag.
        bits |= u64::from(c.transparent);
        bits.to_be_bytes()
    }

    fn unpack(bytes: [u8; 8]) -> Candidate {
        let bits = u64::from_be_bytes(bytes);
        let mode_tag = ((bits >> 61) & 0x7) as u8;
        let mode = Rgb8Mode::from_tag(mode_tag);
        let transparent = (bits & 0x1) != 0;

        if let Rgb8Mode::Planar = mode {
            let read = |shift: u64, width: u32| -> u8 {
                let mask = (1u64 << width) - 1;
                expand_bits(((bits >> shift) & mask) as u8, width)
            };
            let origin = Rgb {
                r: read(55, 6),
                g: read(49, 6),
                b: read(43, 6),
            };
            let h = Rgb {
                r: read(36, 7),
                g: read(29, 7),
                b: read(22, 7),
            };
            let v = Rgb {
                r: read(16, 6),
                g: read(10, 6),
                b: read(4, 6),
            };
            return Candidate {
                mode,
                flip: false,
                table: 0,
                ep1: Rgb::default(),
                ep2: Rgb::default(),
                selectors: [0; 16],
                planar: Some((origin, h, v)),
                transparent,
                error: 0,
            };
        }

        let flip = ((bits >> 60) & 0x1) != 0;
        let table = ((bits >> 57) & 0x7) as u8;
        let read4 = |shift: u64| expand_bits(((bits >> shift) & 0xF) as u8, 4);
        let ep1 = Rgb {
            r: read4(53),
            g: read4(49),
            b: read4(45),
        };
        let ep2 = Rgb {
            r: read4(41),
            g: read4(37),
            b: read4(33),
        };
        let mut selectors = [0u8; 16];
        for (pixel, sel) in selectors.iter_mut().enumerate() {
            let shift = 31 - 2 * pixel as u64;
            *sel = ((bits >> shift) & 0x3) as u8;
        }

        Candidate {
            mode,
            flip,
            table,
            ep1,
            ep2,
            selectors,
            planar: None,
            transparent,
            error: 0,
        }
    }
}

fn clamp_offset(c: Rgb, delta: i32) -> Rgb {
    Rgb {
        r: (i32::from(c.r) + delta).clamp(0, 255) as u8,
        g: (i32::from(c.g) + delta).clamp(0, 255) as u8,
        b: (i32::from(c.b) + delta).clamp(0, 255) as u8,
    }
}

fn apply_delta(c: Rgb, delta: i32) -> Texel {
    rgb_to_texel(clamp_offset(c, delta))
}

fn rgb_to_texel(c: Rgb) -> Texel {
    Texel {
        r: f32::from(c.r) / 255.0,
        g: f32::from(c.g) / 255.0,
        b: f32::from(c.b) / 255.0,
        a: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn flat_tile(r: f32, g: f32, b: f32) -> [Texel; 16] {
        [Texel { r, g, b, a: 1.0 }; 16]
    }

    fn run_to_done(encoder: &mut Rgb8Encoder, effort: f32) {
        while !encoder.is_done() {
            encoder.perform_iteration(effort);
        }
    }

    #[test]
    fn constant_color_round_trips_closely() {
        let source = flat_tile(0.6, 0.2, 0.8);
        let mut encoder = Rgb8Encoder::new();
        encoder.encode(&source, ErrorMetric::Numeric, false);
        run_to_done(&mut encoder, 100.0);

        let bits = encoder.write_encoding_bits();
        let mut decoded = [Texel::default(); 16];
        Rgb8Encoder::decode_only(bits, &mut decoded);
        for pixel in decoded {
            assert!((pixel.r - 0.6).abs() < 0.05);
            assert!((pixel.g - 0.2).abs() < 0.05);
            assert!((pixel.b - 0.8).abs() < 0.05);
        }
    }

    #[test]
    fn transparent_fast_path_is_immediately_done() {
        let source = flat_tile(0.0, 0.0, 0.0);
        let mut encoder = Rgb8Encoder::new();
        encoder.encode(&source, ErrorMetric::Numeric, true);
        assert!(encoder.is_done());
        assert_eq!(encoder.error(), 0.0);
    }

    #[test]
    fn transparent_block_round_trips_zero_alpha() {
        let source = flat_tile(0.0, 0.0, 0.0);
        let mut encoder = Rgb8Encoder::new();
        encoder.encode(&source, ErrorMetric::Numeric, true);

        let bits = encoder.write_encoding_bits();
        let mut decoded = [Texel::default(); 16];
        Rgb8Encoder::decode_only(bits, &mut decoded);
        for pixel in decoded {
            assert_eq!(pixel.a, 0.0);
        }
    }

    #[test]
    fn opaque_block_round_trips_full_alpha() {
        let source = flat_tile(0.6, 0.2, 0.8);
        let mut encoder = Rgb8Encoder::new();
        encoder.encode(&source, ErrorMetric::Numeric, false);
        run_to_done(&mut encoder, 100.0);

        let bits = encoder.write_encoding_bits();
        let mut decoded = [Texel::default(); 16];
        Rgb8Encoder::decode_only(bits, &mut decoded);
        for pixel in decoded {
            assert_eq!(pixel.a, 1.0);
        }
    }

    #[test]
    fn decode_resumes_iteration_instead_of_resetting_to_zero() {
        let source = flat_tile(0.6, 0.2, 0.8);
        let mut encoder = Rgb8Encoder::new();
        encoder.encode(&source, ErrorMetric::Numeric, false);
        encoder.perform_iteration(100.0);
        assert_eq!(encoder.iteration_count(), 1);

        let bits = encoder.write_encoding_bits();
        let last_state = encoder.iteration_count() as u8;

        let mut resumed = Rgb8Encoder::new();
        resumed.decode(bits, &source, ErrorMetric::Numeric, last_state);
        assert_eq!(resumed.iteration_count(), 1);
    }

    #[test]
    fn multipass_resume_reaches_terminal_iteration_within_bounded_passes() {
        // Regression test for a driver-level non-termination bug: resuming
        // via `decode` must advance `iteration`, not reset it to 0, or a
        // multi-pass loop that never hits exact-zero error on ETC1 alone
        // would never reach T/H/Planar and would never terminate.
        let source = flat_tile(0.6, 0.2, 0.8);
        let mut encoder = Rgb8Encoder::new();
        encoder.encode(&source, ErrorMetric::Numeric, false);

        let mut last_state = 0u8;
        for _ in 0..TERMINAL_ITERATION + 1 {
            if encoder.is_done() {
                break;
            }
            encoder.perform_iteration(100.0);
            let bits = encoder.write_encoding_bits();
            last_state = encoder.iteration_count() as u8;
            encoder.decode(bits, &source, ErrorMetric::Numeric, last_state);
        }
        assert!(encoder.is_done() || last_state >= TERMINAL_ITERATION as u8);
    }

    #[test]
    fn error_is_monotonically_non_increasing() {
        let mut source = [Texel::default(); 16];
        for x in 0..4 {
            for y in 0..4 {
                source[x * 4 + y] = Texel {
                    r: x as f32 / 3.0,
                    g: y as f32 / 3.0,
                    b: 0.5,
                    a: 1.0,
                };
            }
        }
        let mut encoder = Rgb8Encoder::new();
        encoder.encode(&source, ErrorMetric::Numeric, false);
        let mut last = f32::MAX;
        while !encoder.is_done() {
            encoder.perform_iteration(100.0);
            assert!(encoder.error() <= last);
            last = encoder.error();
        }
    }
}
