//! ETC2/EAC block-compression engine and container I/O: gather 4x4 tiles
//! from a source image, search for the best encoding of each, and read or
//! write the result as DDS, KTX2, or PNG.

pub mod bc;
pub mod block;
pub mod container;
pub mod driver;
pub mod error;
pub mod format;

pub use container::texture::Texture;
pub use driver::{EncodeMode, ImageDriver};
pub use error::{DecompressError, EncodeError, ReadError, ToImageError};
pub use format::{BcFormat, ErrorMetric, Format, TextureFileFormat};
