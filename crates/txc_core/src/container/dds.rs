//! DDS container support for the BC family. ETC2 payloads are carried in
//! [`super::ktx2`] instead: neither the classic FourCC table nor DXGI has a
//! code point for ETC2/EAC, so a DDS can only round-trip what
//! [`crate::bc`] produces (plus plain uncompressed RGBA8).

use std::io;

use byteorder::{ReadBytesExt, LE};
use ddsfile::{AlphaMode, D3D10ResourceDimension, DxgiFormat, NewDxgiParams};

use crate::driver::source::RgbaSurface;
use crate::error::{DecompressError, ReadError, ToImageError};
use crate::format::BcFormat;

/// A decoded DDS: dimensions, the BC (or uncompressed) layout, and its
/// first mip level's raw bytes.
#[derive(Clone, Debug)]
pub struct DdsImage {
    pub width: u32,
    pub height: u32,
    pub payload: DdsPayload,
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DdsPayload {
    Bc(BcFormat),
    Rgba8 { srgb: bool },
}

impl DdsPayload {
    fn dxgi_format(self) -> DxgiFormat {
        match self {
            DdsPayload::Rgba8 { srgb: false } => DxgiFormat::R8G8B8A8_UNorm,
            DdsPayload::Rgba8 { srgb: true } => DxgiFormat::R8G8B8A8_UNorm_sRGB,
            DdsPayload::Bc(BcFormat::Bc1) => DxgiFormat::BC1_UNorm,
            DdsPayload::Bc(BcFormat::Bc3) => DxgiFormat::BC3_UNorm,
            DdsPayload::Bc(BcFormat::Bc4) => DxgiFormat::BC4_UNorm,
            DdsPayload::Bc(BcFormat::Bc5) => DxgiFormat::BC5_UNorm,
        }
    }

    fn from_dxgi_format(format: DxgiFormat) -> Option<Self> {
        Some(match format {
            DxgiFormat::R8G8B8A8_UNorm => DdsPayload::Rgba8 { srgb: false },
            DxgiFormat::R8G8B8A8_UNorm_sRGB => DdsPayload::Rgba8 { srgb: true },
            DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => DdsPayload::Bc(BcFormat::Bc1),
            DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => DdsPayload::Bc(BcFormat::Bc3),
            DxgiFormat::BC4_UNorm => DdsPayload::Bc(BcFormat::Bc4),
            DxgiFormat::BC5_UNorm => DdsPayload::Bc(BcFormat::Bc5),
            _ => return None,
        })
    }
}

/// Build a single-mip, single-layer DDS in memory.
pub fn build(width: u32, height: u32, payload: DdsPayload, data: &[u8]) -> Result<ddsfile::Dds, ReadError> {
    let mut dds = ddsfile::Dds::new_dxgi(NewDxgiParams {
        height,
        width,
        depth: None,
        format: payload.dxgi_format(),
        mipmap_levels: Some(1),
        array_layers: Some(1),
        caps2: None,
        is_cubemap: false,
        resource_dimension: D3D10ResourceDimension::Texture2D,
        alpha_mode: AlphaMode::Straight,
    })?;
    dds.get_mut_data(0)?.copy_from_slice(data);
    Ok(dds)
}

/// Write a single-mip DDS to `writer`.
pub fn write<W: io::Write>(writer: &mut W, width: u32, height: u32, payload: DdsPayload, data: &[u8]) -> Result<(), ReadError> {
    let dds = build(width, height, payload, data)?;
    dds.write(writer)?;
    Ok(())
}

/// Read a DDS, keeping only its first mip level.
pub fn read<R: io::Read>(reader: &mut R) -> Result<DdsImage, ReadError> {
    let magic = reader.read_u32::<LE>()?;
    const DDS_MAGIC: u32 = u32::from_le_bytes(*b"DDS ");
    if magic != DDS_MAGIC {
        return Err(ReadError::UnexpectedMagic { expected: DDS_MAGIC, got: magic });
    }

    let header = ddsfile::Header::read(&mut *reader)?;
    let header10 = if header.spf.fourcc == Some(ddsfile::FourCC(ddsfile::FourCC::DX10)) {
        Some(ddsfile::Header10::read(&mut *reader)?)
    } else {
        None
    };

    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let width = header.width;
    let height = header.height;

    let dxgi_format = header10
        .as_ref()
        .map(|h| h.dxgi_format)
        .ok_or(ReadError::UnsupportedFeature("DDS file has no DX10 header; legacy FourCC formats are not supported"))?;

    let payload = DdsPayload::from_dxgi_format(dxgi_format)
        .ok_or(ReadError::UnsupportedFeature("unrecognized DXGI format for this toolkit"))?;

    Ok(DdsImage { width, height, payload, data })
}

impl DdsImage {
    /// Convert an uncompressed RGBA8 payload into a driver-ready surface.
    /// BC payloads need `decode_bc_to_rgba8` first, since `image_dds` is
    /// what actually decompresses the blocks.
    pub fn into_rgba_surface(self) -> Result<RgbaSurface, ToImageError> {
        let DdsPayload::Rgba8 { .. } = self.payload else {
            return Err(ToImageError::InvalidContainerSize);
        };
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() != expected {
            return Err(ToImageError::InvalidContainerSize);
        }
        Ok(RgbaSurface::from_rgba8(self.width, self.height, &self.data))
    }
}

/// Decode a BC-family payload's first mip level back to RGBA8. This is the
/// BC counterpart to the ETC2 engine's own `decode_only` verification path;
/// BC itself is never decoded by hand here since `image_dds` already does
/// it correctly. `image` must carry a [`DdsPayload::Bc`] payload.
pub fn decode_bc_to_rgba8(image: &DdsImage) -> Result<image::RgbaImage, DecompressError> {
    let dds = build(image.width, image.height, image.payload, &image.data)?;
    let surface = image_dds::Surface::from_dds(&dds)?;
    let rgba = surface.decode_layers_mipmaps_rgba8(0..1, 0..1)?;
    Ok(rgba.into_image()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn round_trips_bc1_payload() {
        let data = vec![0x11u8; 8 * 4];
        let mut buf = Vec::new();
        write(&mut buf, 8, 8, DdsPayload::Bc(BcFormat::Bc1), &data).unwrap();

        let image = read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(image.width, 8);
        assert_eq!(image.height, 8);
        assert_eq!(image.payload, DdsPayload::Bc(BcFormat::Bc1));
        assert_eq!(image.data, data);
    }

    #[test]
    fn rgba8_payload_converts_to_a_surface() {
        let data = vec![42u8; 8 * 8 * 4];
        let mut buf = Vec::new();
        write(&mut buf, 8, 8, DdsPayload::Rgba8 { srgb: false }, &data).unwrap();

        let image = read(&mut Cursor::new(buf)).unwrap();
        let surface = image.into_rgba_surface().unwrap();
        let (w, h, out) = surface.into_rgba8();
        assert_eq!((w, h), (8, 8));
        assert_eq!(out, data);
    }

    #[test]
    fn bc_payload_rejects_direct_surface_conversion() {
        let data = vec![0u8; 8 * 4];
        let mut buf = Vec::new();
        write(&mut buf, 8, 8, DdsPayload::Bc(BcFormat::Bc1), &data).unwrap();

        let image = read(&mut Cursor::new(buf)).unwrap();
        assert!(image.into_rgba_surface().is_err());
    }

    #[test]
    fn bc1_payload_decodes_back_to_rgba8() {
        let data = vec![0x11u8; 8 * 4];
        let mut buf = Vec::new();
        write(&mut buf, 8, 8, DdsPayload::Bc(BcFormat::Bc1), &data).unwrap();

        let image = read(&mut Cursor::new(buf)).unwrap();
        let decoded = decode_bc_to_rgba8(&image).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }
}
