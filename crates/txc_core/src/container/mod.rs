//! Texture container formats: DDS (BC family), KTX2 (ETC2/EAC family),
//! and PNG (as a source format only).

pub mod dds;
pub mod ktx2;
pub mod png;
pub mod texture;
