//! BC1/BC3/BC4/BC5 support via `intel_tex_2`, gated behind the
//! `intel-tex` feature. This is a thin collaborator alongside the ETC2
//! engine, not a reimplementation of BC: real-time BC encoding is a
//! solved problem with a well-tested crate already in the ecosystem.

use crate::error::EncodeError;
use crate::format::BcFormat;

#[cfg(feature = "intel-tex")]
use intel_tex_2::{bc1, bc3, bc4, bc5, RSurface, RgSurface, RgbaSurface};

#[cfg(any(feature = "intel-tex", test))]
#[inline]
fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[cfg(any(feature = "intel-tex", test))]
#[inline]
fn quantize_to_bits(x: f32, bits: u8) -> f32 {
    debug_assert!((1..=8).contains(&bits));
    let levels = (1u32 << bits) - 1;
    (x * levels as f32).round() / levels as f32
}

/// Ordered (8x8 Bayer) dither toward RGB565, in place. Reduces banding in
/// BC1/BC3 color endpoints at negligible cost; alpha is untouched.
#[cfg(any(feature = "intel-tex", test))]
fn ordered_dither_rgb565_bayer8_in_place(width: u32, height: u32, rgba: &mut [u8]) {
    let w = width as usize;
    let h = height as usize;
    if w == 0 || h == 0 {
        return;
    }
    debug_assert_eq!(rgba.len(), w * h * 4);

    const BAYER8: [[u8; 8]; 8] = [
        [0, 48, 12, 60, 3, 51, 15, 63],
        [32, 16, 44, 28, 35, 19, 47, 31],
        [8, 56, 4, 52, 11, 59, 7, 55],
        [40, 24, 36, 20, 43, 27, 39, 23],
        [2, 50, 14, 62, 1, 49, 13, 61],
        [34, 18, 46, 30, 33, 17, 45, 29],
        [10, 58, 6, 54, 9, 57, 5, 53],
        [42, 26, 38, 22, 41, 25, 37, 21],
    ];

    let step_r = 1.0 / ((1u32 << 5) - 1) as f32;
    let step_g = 1.0 / ((1u32 << 6) - 1) as f32;
    let step_b = 1.0 / ((1u32 << 5) - 1) as f32;

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) * 4;
            let t = (BAYER8[y & 7][x & 7] as f32 + 0.5) / 64.0 - 0.5;

            let r = rgba[idx] as f32 / 255.0;
            let g = rgba[idx + 1] as f32 / 255.0;
            let b = rgba[idx + 2] as f32 / 255.0;

            let rq = quantize_to_bits(clamp01(r + t * step_r), 5);
            let gq = quantize_to_bits(clamp01(g + t * step_g), 6);
            let bq = quantize_to_bits(clamp01(b + t * step_b), 5);

            rgba[idx] = (rq * 255.0).round().clamp(0.0, 255.0) as u8;
            rgba[idx + 1] = (gq * 255.0).round().clamp(0.0, 255.0) as u8;
            rgba[idx + 2] = (bq * 255.0).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Encode an RGBA8 image into a BC format. `width`/`height` must be
/// multiples of 4 (the BC block size); `intel_tex_2` does not clamp
/// partial blocks the way this crate's own ETC2 path does.
pub fn encode(width: u32, height: u32, rgba_data: &[u8], format: BcFormat) -> Result<Vec<u8>, EncodeError> {
    let expected = width as usize * height as usize * 4;
    if rgba_data.len() != expected {
        return Err(EncodeError::InvalidPixelData { expected, got: rgba_data.len() });
    }

    #[cfg(feature = "intel-tex")]
    {
        match format {
            BcFormat::Bc1 => Ok(encode_bc1(width, height, rgba_data)),
            BcFormat::Bc3 => Ok(encode_bc3(width, height, rgba_data)),
            BcFormat::Bc4 => Ok(encode_bc4(width, height, rgba_data)),
            BcFormat::Bc5 => Ok(encode_bc5(width, height, rgba_data)),
        }
    }
    #[cfg(not(feature = "intel-tex"))]
    {
        let _ = format;
        Err(EncodeError::FeatureDisabled)
    }
}

#[cfg(feature = "intel-tex")]
fn encode_bc1(width: u32, height: u32, rgba_data: &[u8]) -> Vec<u8> {
    let mut rgba = rgba_data.to_vec();
    ordered_dither_rgb565_bayer8_in_place(width, height, &mut rgba);
    let surface = RgbaSurface { data: &rgba, width, height, stride: 4 * width };
    bc1::compress_blocks(&surface)
}

#[cfg(feature = "intel-tex")]
fn encode_bc3(width: u32, height: u32, rgba_data: &[u8]) -> Vec<u8> {
    let mut rgba = rgba_data.to_vec();
    ordered_dither_rgb565_bayer8_in_place(width, height, &mut rgba);
    let surface = RgbaSurface { data: &rgba, width, height, stride: 4 * width };
    bc3::compress_blocks(&surface)
}

#[cfg(feature = "intel-tex")]
fn encode_bc4(width: u32, height: u32, rgba_data: &[u8]) -> Vec<u8> {
    // BC4 carries a single channel; feed it the red channel, matching this
    // crate's EAC R11 convention of treating single-channel formats as red.
    let red: Vec<u8> = rgba_data.chunks_exact(4).map(|p| p[0]).collect();
    let surface = RSurface { data: &red, width, height, stride: width };
    bc4::compress_blocks(&surface)
}

#[cfg(feature = "intel-tex")]
fn encode_bc5(width: u32, height: u32, rgba_data: &[u8]) -> Vec<u8> {
    let rg: Vec<u8> = rgba_data.chunks_exact(4).flat_map(|p| [p[0], p[1]]).collect();
    let surface = RgSurface { data: &rg, width, height, stride: width * 2 };
    bc5::compress_blocks(&surface)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dithering_preserves_alpha_and_dimensions() {
        let width = 8;
        let height = 8;
        let mut rgba = vec![128u8; (width * height * 4) as usize];
        for p in rgba.chunks_exact_mut(4) {
            p[3] = 200;
        }
        ordered_dither_rgb565_bayer8_in_place(width, height, &mut rgba);
        assert_eq!(rgba.len(), (width * height * 4) as usize);
        assert!(rgba.chunks_exact(4).all(|p| p[3] == 200));
    }

    #[test]
    #[cfg(not(feature = "intel-tex"))]
    fn encode_without_feature_is_an_error() {
        let data = vec![0u8; 8 * 8 * 4];
        let result = encode(8, 8, &data, BcFormat::Bc1);
        assert!(matches!(result, Err(EncodeError::FeatureDisabled)));
    }

    #[test]
    fn rejects_mismatched_pixel_data_length() {
        let data = vec![0u8; 4];
        let result = encode(8, 8, &data, BcFormat::Bc1);
        assert!(matches!(result, Err(EncodeError::InvalidPixelData { .. })));
    }
}
