use std::fmt::Display;
use std::io;

use byteorder::{ReadBytesExt, LE};

use crate::error::ReadError;

/// Block-compressed (and uncompressed) pixel formats the encoder understands.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Format {
    Etc1,
    Rgb8,
    Srgb8,
    Rgba8,
    Srgba8,
    Rgb8A1,
    Srgb8A1,
    R11,
    SignedR11,
    Rg11,
    SignedRg11,
}

impl Format {
    /// Whether this format carries an alpha plane at all.
    #[must_use]
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            Format::Rgba8 | Format::Srgba8 | Format::Rgb8A1 | Format::Srgb8A1
        )
    }

    /// Whether alpha is punch-through (1 bit, snapped to {0,1} on encode).
    #[must_use]
    pub fn is_punch_through(self) -> bool {
        matches!(self, Format::Rgb8A1 | Format::Srgb8A1)
    }

    /// Whether the format's channel(s) are signed (snorm) rather than unorm.
    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(self, Format::SignedR11 | Format::SignedRg11)
    }

    #[must_use]
    pub fn is_dual_channel(self) -> bool {
        matches!(self, Format::Rg11 | Format::SignedRg11)
    }

    #[must_use]
    pub fn is_single_channel(self) -> bool {
        matches!(self, Format::R11 | Format::SignedR11)
    }

    /// Bytes per 4x4 block.
    #[must_use]
    pub fn bytes_per_block(self) -> usize {
        match self {
            Format::Etc1
            | Format::Rgb8
            | Format::Srgb8
            | Format::Rgb8A1
            | Format::Srgb8A1
            | Format::R11
            | Format::SignedR11 => 8,
            Format::Rgba8 | Format::Srgba8 | Format::Rg11 | Format::SignedRg11 => 16,
        }
    }
}

/// Error metric used to score candidate selectors/endpoints during search.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum ErrorMetric {
    /// Only the red channel contributes (source is assumed R==G==B).
    Gray,
    /// Sum of squared channel deltas, with perceptual weighting baked into
    /// the RGB8 sub-mode arbitration thresholds.
    #[default]
    Rec709,
    /// Sum of squared channel deltas over RGB; alpha never contributes.
    Numeric,
}

/// BC family formats handled by the external collaborator in [`crate::bc`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum BcFormat {
    Bc1,
    Bc3,
    Bc4,
    Bc5,
}

impl BcFormat {
    #[must_use]
    pub fn bytes_per_block(self) -> usize {
        match self {
            BcFormat::Bc1 | BcFormat::Bc4 => 8,
            BcFormat::Bc3 | BcFormat::Bc5 => 16,
        }
    }
}

/// Container file format, identified from the leading magic bytes.
#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq)]
pub enum TextureFileFormat {
    Dds,
    Ktx,
    Ktx2,
    Png,
    Unknown,
}

impl Display for TextureFileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TextureFileFormat::Dds => "DDS",
            TextureFileFormat::Ktx => "KTX",
            TextureFileFormat::Ktx2 => "KTX2",
            TextureFileFormat::Png => "PNG",
            TextureFileFormat::Unknown => "unknown",
        })
    }
}

impl TextureFileFormat {
    pub const DDS_MAGIC: u32 = u32::from_le_bytes(*b"DDS ");
    pub const KTX2_IDENTIFIER: [u8; 12] = [
        0xAB, 0x4B, 0x54, 0x58, 0x20, 0x32, 0x30, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
    ];
    pub const KTX1_IDENTIFIER: [u8; 12] = [
        0xAB, 0x4B, 0x54, 0x58, 0x20, 0x31, 0x31, 0xBB, 0x0D, 0x0A, 0x1A, 0x0A,
    ];
    pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    /// Identify the file format by peeking at its first 12 bytes.
    ///
    /// The reader is left positioned just past the bytes that were
    /// inspected; callers that need the full header should re-open or seek
    /// back before handing the reader to a format-specific reader.
    pub fn identify<R: io::Read + ?Sized>(reader: &mut R) -> Result<Self, ReadError> {
        let mut head = [0u8; 12];
        reader.read_exact(&mut head)?;

        if head[..8] == Self::PNG_SIGNATURE {
            return Ok(Self::Png);
        }
        if head == Self::KTX2_IDENTIFIER {
            return Ok(Self::Ktx2);
        }
        if head == Self::KTX1_IDENTIFIER {
            return Ok(Self::Ktx);
        }
        let magic = (&head[..4]).read_u32::<LE>()?;
        if magic == Self::DDS_MAGIC {
            return Ok(Self::Dds);
        }
        Ok(Self::Unknown)
    }
}
