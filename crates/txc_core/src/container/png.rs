//! PNG support, used only as a convenient source format to feed the block
//! encoder — this toolkit never writes compressed textures out as PNG.

use std::io;

use image::{DynamicImage, RgbaImage};

use crate::error::ReadError;

/// Decode a PNG into an owned RGBA8 image.
pub fn read<R: io::Read>(reader: &mut R) -> Result<RgbaImage, ReadError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let image = image::load_from_memory_with_format(&data, image::ImageFormat::Png)?;
    Ok(image.into_rgba8())
}

/// Encode an RGBA8 image as PNG, mainly useful for dumping a decoded
/// block-compressed texture for visual inspection.
pub fn write<W: io::Write + io::Seek>(writer: &mut W, width: u32, height: u32, rgba8: &[u8]) -> Result<(), ReadError> {
    let image = DynamicImage::ImageRgba8(
        RgbaImage::from_raw(width, height, rgba8.to_vec()).ok_or(ReadError::UnsupportedFeature("RGBA8 buffer size does not match width*height*4"))?,
    );
    image.write_to(writer, image::ImageFormat::Png)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    #[test]
    fn round_trips_a_flat_image() {
        let width = 4;
        let height = 4;
        let mut data = vec![0u8; (width * height * 4) as usize];
        for p in data.chunks_exact_mut(4) {
            p.copy_from_slice(&[10, 20, 30, 255]);
        }

        let mut buf = Vec::new();
        write(&mut buf, width, height, &data).unwrap();

        let decoded = read(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded.width(), width);
        assert_eq!(decoded.height(), height);
        assert_eq!(decoded.into_raw(), data);
    }
}
