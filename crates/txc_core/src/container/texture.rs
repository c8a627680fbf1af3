//! [`Texture`]: a single type spanning every container this crate reads, so
//! callers don't have to match on file format before they can ask "give me
//! RGBA8" or "how big is this".

use std::io;

use image::RgbaImage;

use super::{dds, ktx2, png};
use crate::driver::decode::decode_to_rgba8;
use crate::error::{DecompressError, ReadError, ToImageError};
use crate::format::TextureFileFormat;
use crate::container::dds::{DdsImage, DdsPayload};
use crate::container::ktx2::{Ktx2Image, Ktx2Payload};

#[derive(Debug)]
pub enum Texture {
    Dds(DdsImage),
    Ktx2(Ktx2Image),
    Png(RgbaImage),
}

impl Texture {
    /// Sniff the container format from the leading bytes and read it.
    pub fn open<R: io::Read + io::Seek>(reader: &mut R) -> Result<Self, ReadError> {
        let format = TextureFileFormat::identify(reader)?;
        reader.seek(io::SeekFrom::Start(0))?;
        match format {
            TextureFileFormat::Dds => Ok(Texture::Dds(dds::read(reader)?)),
            TextureFileFormat::Ktx2 => Ok(Texture::Ktx2(ktx2::read(reader)?)),
            TextureFileFormat::Png => Ok(Texture::Png(png::read(reader)?)),
            TextureFileFormat::Ktx => Err(ReadError::UnsupportedTextureFormat(format)),
            TextureFileFormat::Unknown => {
                let mut head = [0u8; 4];
                reader.seek(io::SeekFrom::Start(0))?;
                reader.read_exact(&mut head)?;
                Err(ReadError::UnknownTextureFormat(u32::from_le_bytes(head)))
            }
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Texture::Dds(dds) => dds.width,
            Texture::Ktx2(ktx2) => ktx2.width,
            Texture::Png(img) => img.width(),
        }
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        match self {
            Texture::Dds(dds) => dds.height,
            Texture::Ktx2(ktx2) => ktx2.height,
            Texture::Png(img) => img.height(),
        }
    }

    /// Decode to a plain RGBA8 image regardless of the underlying payload.
    pub fn decode_to_rgba8(&self) -> Result<RgbaImage, DecompressError> {
        match self {
            Texture::Dds(dds) => match dds.payload {
                DdsPayload::Rgba8 { .. } => {
                    let (w, h, data) = dds.clone().into_rgba_surface()?.into_rgba8();
                    Ok(RgbaImage::from_raw(w, h, data).expect("surface dimensions match its own buffer"))
                }
                DdsPayload::Bc(_) => dds::decode_bc_to_rgba8(dds),
            },
            Texture::Ktx2(ktx2) => match ktx2.payload {
                Ktx2Payload::Rgba8 { .. } => {
                    let expected = ktx2.width as usize * ktx2.height as usize * 4;
                    if ktx2.data.len() != expected {
                        return Err(DecompressError::from(ToImageError::InvalidContainerSize));
                    }
                    Ok(RgbaImage::from_raw(ktx2.width, ktx2.height, ktx2.data.clone())
                        .expect("length already validated against width*height*4"))
                }
                Ktx2Payload::Bc(format) => {
                    let as_dds = DdsImage {
                        width: ktx2.width,
                        height: ktx2.height,
                        payload: DdsPayload::Bc(format),
                        data: ktx2.data.clone(),
                    };
                    dds::decode_bc_to_rgba8(&as_dds)
                }
                Ktx2Payload::Etc2(format) => {
                    let surface = decode_to_rgba8(&ktx2.data, ktx2.width, ktx2.height, format);
                    let (w, h, data) = surface.into_rgba8();
                    Ok(RgbaImage::from_raw(w, h, data).expect("surface dimensions match its own buffer"))
                }
            },
            Texture::Png(img) => Ok(img.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn opens_a_png_by_sniffing_magic() {
        let mut png_bytes = Vec::new();
        crate::container::png::write(&mut Cursor::new(&mut png_bytes), 2, 2, &[200u8; 2 * 2 * 4]).unwrap();

        let texture = Texture::open(&mut Cursor::new(png_bytes)).unwrap();
        assert_eq!((texture.width(), texture.height()), (2, 2));
        let rgba = texture.decode_to_rgba8().unwrap();
        assert_eq!(rgba.get_pixel(0, 0).0, [200, 200, 200, 255]);
    }

    #[test]
    fn opens_a_ktx2_etc2_payload_and_decodes_it() {
        use crate::format::{ErrorMetric, Format};
        use crate::driver::{EncodeMode, ImageDriver};
        use crate::driver::source::RgbaSurface;

        let flat = vec![10u8, 20, 30, 255].repeat(16);
        let surface = RgbaSurface::from_rgba8(4, 4, &flat);
        let encoded = ImageDriver::encode(&surface, Format::Rgb8, ErrorMetric::default(), EncodeMode::SinglePass, 100.0);

        let mut buf = Vec::new();
        ktx2::write(&mut buf, 4, 4, Ktx2Payload::Etc2(Format::Rgb8), &encoded).unwrap();

        let texture = Texture::open(&mut Cursor::new(buf)).unwrap();
        let rgba = texture.decode_to_rgba8().unwrap();
        let pixel = rgba.get_pixel(0, 0);
        assert!((i32::from(pixel[0]) - 10).abs() < 8);
        assert!((i32::from(pixel[1]) - 20).abs() < 8);
        assert!((i32::from(pixel[2]) - 30).abs() < 8);
    }

    #[test]
    fn truncated_ktx2_rgba8_payload_errors_instead_of_panicking() {
        let mut buf = Vec::new();
        // One byte short of width*height*4 = 16.
        let truncated = vec![0u8; 15];
        ktx2::write(&mut buf, 2, 2, Ktx2Payload::Rgba8 { srgb: false }, &truncated).unwrap();

        let texture = Texture::open(&mut Cursor::new(buf)).unwrap();
        let result = texture.decode_to_rgba8();
        assert!(matches!(result, Err(DecompressError::ToImage(ToImageError::InvalidContainerSize))));
    }
}
