use thiserror::Error;

use crate::format::TextureFileFormat;

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("Unexpected magic, expected {expected:#x}, got {got:#x}")]
    UnexpectedMagic { expected: u32, got: u32 },

    #[error("Invalid texture file format! Got magic: '{0:#x}'")]
    UnknownTextureFormat(u32),
    #[error("Unsupported texture file format - '{0}'!")]
    UnsupportedTextureFormat(TextureFileFormat),
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(&'static str),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Error reading DDS file: {0}")]
    Dds(#[from] ddsfile::Error),
    #[error("Error decoding DDS file: {0}")]
    DdsDecodeError(#[from] image_dds::error::CreateImageError),
    #[error("Error decoding PNG file: {0}")]
    PngDecodeError(#[from] image::ImageError),
}

#[derive(Error, Debug)]
pub enum DecompressError {
    #[error("Error decoding block at tile ({x}, {y}): {reason}")]
    Block { x: u32, y: u32, reason: &'static str },
    #[error(transparent)]
    Dds(#[from] image_dds::error::SurfaceError),
    #[error(transparent)]
    DdsCreate(#[from] image_dds::error::CreateImageError),
    #[error("Error rebuilding container for decode: {0}")]
    Rebuild(#[from] ReadError),
    #[error(transparent)]
    ToImage(#[from] ToImageError),
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Unsupported format for BC encoding: {0:?}")]
    UnsupportedFormat(crate::format::BcFormat),
    #[error("Invalid pixel data: expected {expected} bytes, got {got}")]
    InvalidPixelData { expected: usize, got: usize },
    #[error("BC encoding support was not compiled in (enable the `intel-tex` feature)")]
    FeatureDisabled,
}

#[derive(Error, Debug)]
pub enum ToImageError {
    #[error("Invalid container size")]
    InvalidContainerSize,
    #[error(transparent)]
    Dds(#[from] image_dds::error::CreateImageError),
}
