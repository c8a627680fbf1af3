//! Minimal KTX2 container support: a single-level, single-layer writer for
//! this crate's own compressed formats, and a reader that parses just
//! enough of the header/level index to hand back raw block bytes.
//!
//! Mip chains, arrays, cubemaps, and supercompression are out of scope;
//! Basis transcoding doubly so, since this toolkit produces ETC2 payloads
//! directly rather than going through Basis Universal.

use std::io::{self, Read, Write};

use byteorder::{ReadBytesExt, WriteBytesExt, LE};

use crate::error::ReadError;
use crate::format::{BcFormat, Format, TextureFileFormat};

const HEADER_LEN: u64 = 80;
const LEVEL_ENTRY_LEN: u64 = 24;

// Vulkan VkFormat values used by the formats this crate produces.
const VK_FORMAT_R8G8B8A8_UNORM: u32 = 37;
const VK_FORMAT_R8G8B8A8_SRGB: u32 = 43;
const VK_FORMAT_BC1_RGB_UNORM: u32 = 131;
const VK_FORMAT_BC1_RGB_SRGB: u32 = 132;
const VK_FORMAT_BC3_UNORM: u32 = 137;
const VK_FORMAT_BC3_SRGB: u32 = 138;
const VK_FORMAT_BC4_UNORM: u32 = 139;
const VK_FORMAT_BC5_UNORM: u32 = 141;
const VK_FORMAT_ETC2_R8G8B8_UNORM: u32 = 147;
const VK_FORMAT_ETC2_R8G8B8_SRGB: u32 = 148;
const VK_FORMAT_ETC2_R8G8B8A1_UNORM: u32 = 149;
const VK_FORMAT_ETC2_R8G8B8A1_SRGB: u32 = 150;
const VK_FORMAT_ETC2_R8G8B8A8_UNORM: u32 = 151;
const VK_FORMAT_ETC2_R8G8B8A8_SRGB: u32 = 152;
const VK_FORMAT_EAC_R11_UNORM: u32 = 153;
const VK_FORMAT_EAC_R11_SNORM: u32 = 154;
const VK_FORMAT_EAC_R11G11_UNORM: u32 = 155;
const VK_FORMAT_EAC_R11G11_SNORM: u32 = 156;

/// Block-compressed or uncompressed pixel layout a KTX2 payload can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ktx2Payload {
    Etc2(Format),
    Bc(BcFormat),
    Rgba8 { srgb: bool },
}

impl Ktx2Payload {
    fn vk_format(self) -> u32 {
        match self {
            Ktx2Payload::Rgba8 { srgb: false } => VK_FORMAT_R8G8B8A8_UNORM,
            Ktx2Payload::Rgba8 { srgb: true } => VK_FORMAT_R8G8B8A8_SRGB,
            Ktx2Payload::Bc(BcFormat::Bc1) => VK_FORMAT_BC1_RGB_UNORM,
            Ktx2Payload::Bc(BcFormat::Bc3) => VK_FORMAT_BC3_UNORM,
            Ktx2Payload::Bc(BcFormat::Bc4) => VK_FORMAT_BC4_UNORM,
            Ktx2Payload::Bc(BcFormat::Bc5) => VK_FORMAT_BC5_UNORM,
            Ktx2Payload::Etc2(Format::Rgb8) | Ktx2Payload::Etc2(Format::Etc1) => VK_FORMAT_ETC2_R8G8B8_UNORM,
            Ktx2Payload::Etc2(Format::Srgb8) => VK_FORMAT_ETC2_R8G8B8_SRGB,
            Ktx2Payload::Etc2(Format::Rgb8A1) => VK_FORMAT_ETC2_R8G8B8A1_UNORM,
            Ktx2Payload::Etc2(Format::Srgb8A1) => VK_FORMAT_ETC2_R8G8B8A1_SRGB,
            Ktx2Payload::Etc2(Format::Rgba8) => VK_FORMAT_ETC2_R8G8B8A8_UNORM,
            Ktx2Payload::Etc2(Format::Srgba8) => VK_FORMAT_ETC2_R8G8B8A8_SRGB,
            Ktx2Payload::Etc2(Format::R11) => VK_FORMAT_EAC_R11_UNORM,
            Ktx2Payload::Etc2(Format::SignedR11) => VK_FORMAT_EAC_R11_SNORM,
            Ktx2Payload::Etc2(Format::Rg11) => VK_FORMAT_EAC_R11G11_UNORM,
            Ktx2Payload::Etc2(Format::SignedRg11) => VK_FORMAT_EAC_R11G11_SNORM,
        }
    }

    fn from_vk_format(vk_format: u32) -> Option<Self> {
        Some(match vk_format {
            VK_FORMAT_R8G8B8A8_UNORM => Ktx2Payload::Rgba8 { srgb: false },
            VK_FORMAT_R8G8B8A8_SRGB => Ktx2Payload::Rgba8 { srgb: true },
            VK_FORMAT_BC1_RGB_UNORM | VK_FORMAT_BC1_RGB_SRGB => Ktx2Payload::Bc(BcFormat::Bc1),
            VK_FORMAT_BC3_UNORM | VK_FORMAT_BC3_SRGB => Ktx2Payload::Bc(BcFormat::Bc3),
            VK_FORMAT_BC4_UNORM => Ktx2Payload::Bc(BcFormat::Bc4),
            VK_FORMAT_BC5_UNORM => Ktx2Payload::Bc(BcFormat::Bc5),
            VK_FORMAT_ETC2_R8G8B8_UNORM => Ktx2Payload::Etc2(Format::Rgb8),
            VK_FORMAT_ETC2_R8G8B8_SRGB => Ktx2Payload::Etc2(Format::Srgb8),
            VK_FORMAT_ETC2_R8G8B8A1_UNORM => Ktx2Payload::Etc2(Format::Rgb8A1),
            VK_FORMAT_ETC2_R8G8B8A1_SRGB => Ktx2Payload::Etc2(Format::Srgb8A1),
            VK_FORMAT_ETC2_R8G8B8A8_UNORM => Ktx2Payload::Etc2(Format::Rgba8),
            VK_FORMAT_ETC2_R8G8B8A8_SRGB => Ktx2Payload::Etc2(Format::Srgba8),
            VK_FORMAT_EAC_R11_UNORM => Ktx2Payload::Etc2(Format::R11),
            VK_FORMAT_EAC_R11_SNORM => Ktx2Payload::Etc2(Format::SignedR11),
            VK_FORMAT_EAC_R11G11_UNORM => Ktx2Payload::Etc2(Format::Rg11),
            VK_FORMAT_EAC_R11G11_SNORM => Ktx2Payload::Etc2(Format::SignedRg11),
            _ => return None,
        })
    }
}

/// A decoded KTX2 container: dimensions, the payload's pixel layout, and
/// its single mip level's raw bytes.
#[derive(Clone, Debug)]
pub struct Ktx2Image {
    pub width: u32,
    pub height: u32,
    pub payload: Ktx2Payload,
    pub data: Vec<u8>,
}

/// Write a single-level, single-layer, non-supercompressed KTX2 container.
pub fn write<W: Write>(writer: &mut W, width: u32, height: u32, payload: Ktx2Payload, data: &[u8]) -> io::Result<()> {
    writer.write_all(&TextureFileFormat::KTX2_IDENTIFIER)?;
    writer.write_u32::<LE>(payload.vk_format())?;
    writer.write_u32::<LE>(1)?; // typeSize: 1 for block-compressed/byte payloads
    writer.write_u32::<LE>(width)?;
    writer.write_u32::<LE>(height)?;
    writer.write_u32::<LE>(0)?; // pixelDepth: 2D texture
    writer.write_u32::<LE>(0)?; // layerCount: not an array
    writer.write_u32::<LE>(1)?; // faceCount: not a cubemap
    writer.write_u32::<LE>(1)?; // levelCount
    writer.write_u32::<LE>(0)?; // supercompressionScheme: none

    // index: dfdByteOffset/Length, kvdByteOffset/Length, sgdByteOffset/Length
    // all zero since this writer emits no data-format-descriptor or
    // key/value metadata.
    for _ in 0..6 {
        writer.write_u32::<LE>(0)?;
    }

    let level_offset = HEADER_LEN + LEVEL_ENTRY_LEN;
    writer.write_u64::<LE>(level_offset)?;
    writer.write_u64::<LE>(data.len() as u64)?;
    writer.write_u64::<LE>(data.len() as u64)?; // uncompressed == compressed, no supercompression

    writer.write_all(data)?;
    Ok(())
}

/// Read a single-level KTX2 container written by [`write`].
pub fn read<R: Read>(reader: &mut R) -> Result<Ktx2Image, ReadError> {
    let mut identifier = [0u8; 12];
    reader.read_exact(&mut identifier)?;
    if identifier != TextureFileFormat::KTX2_IDENTIFIER {
        return Err(ReadError::UnsupportedFeature("not a KTX2 file"));
    }

    let vk_format = reader.read_u32::<LE>()?;
    let _type_size = reader.read_u32::<LE>()?;
    let width = reader.read_u32::<LE>()?;
    let height = reader.read_u32::<LE>()?;
    let _pixel_depth = reader.read_u32::<LE>()?;
    let _layer_count = reader.read_u32::<LE>()?;
    let _face_count = reader.read_u32::<LE>()?;
    let level_count = reader.read_u32::<LE>()?;
    let supercompression_scheme = reader.read_u32::<LE>()?;
    if supercompression_scheme != 0 {
        return Err(ReadError::UnsupportedFeature("KTX2 supercompression is not supported"));
    }
    if level_count > 1 {
        return Err(ReadError::UnsupportedFeature("multi-level KTX2 mip chains are not supported"));
    }

    for _ in 0..6 {
        reader.read_u32::<LE>()?;
    }

    let _byte_offset = reader.read_u64::<LE>()?;
    let byte_length = reader.read_u64::<LE>()?;
    let _uncompressed_byte_length = reader.read_u64::<LE>()?;

    let payload = Ktx2Payload::from_vk_format(vk_format)
        .ok_or(ReadError::UnsupportedFeature("unrecognized KTX2 VkFormat"))?;

    let mut data = vec![0u8; byte_length as usize];
    reader.read_exact(&mut data)?;

    Ok(Ktx2Image { width, height, payload, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn round_trips_etc2_payload() {
        let data = vec![0xAB; 8 * 4];
        let mut buf = Vec::new();
        write(&mut buf, 8, 8, Ktx2Payload::Etc2(Format::Rgb8), &data).unwrap();

        let image = read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(image.width, 8);
        assert_eq!(image.height, 8);
        assert_eq!(image.payload, Ktx2Payload::Etc2(Format::Rgb8));
        assert_eq!(image.data, data);
    }

    #[test]
    fn rejects_non_ktx2_identifier() {
        let mut buf = vec![0u8; 80];
        buf[0] = 0; // corrupt the identifier
        assert!(read(&mut Cursor::new(buf)).is_err());
    }
}
