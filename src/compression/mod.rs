
//! Contains the generic compression method definition
//! and methods to compress and decompress payload units.

// private modules make non-breaking changes easier
mod zip;

#[cfg(feature = "brotli")]
mod brotli;


use crate::error::{Error, Result};

/// A byte vector.
pub type ByteVec = Vec<u8>;

/// A byte slice.
pub type Bytes<'s> = &'s [u8];


/// Specifies which generic compression method wraps the payload bytes.
/// `Store` keeps the bytes unchanged; the other methods compress each
/// unit independently and losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {

    /// Store units without compression.
    Store,

    /// Zlib-wrapped deflate units.
    Zlib,

    /// Raw deflate units, without the zlib wrapper.
    Deflate,

    /// Brotli units. Only available when the `brotli` feature is enabled;
    /// otherwise this method fails as unsupported, never as invalid.
    Brotli,
}

impl std::fmt::Display for Compression {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} compression", match self {
            Compression::Store => "no",
            Compression::Zlib => "zlib",
            Compression::Deflate => "deflate",
            Compression::Brotli => "brotli",
        })
    }
}

impl Compression {

    /// Decompress the bytes of one compressed unit.
    pub fn decompress(self, unit_bytes: Bytes<'_>) -> Result<ByteVec> {
        let bytes = match self {
            Compression::Store => Ok(unit_bytes.to_vec()),
            Compression::Zlib => zip::decompress_zlib(unit_bytes),
            Compression::Deflate => zip::decompress_deflate(unit_bytes),

            #[cfg(feature = "brotli")]
            Compression::Brotli => self::brotli::decompress(unit_bytes),

            #[cfg(not(feature = "brotli"))]
            Compression::Brotli => return Err(Error::unsupported(
                "brotli compressed units (the `brotli` feature is disabled)"
            )),
        };

        bytes.map_err(|error| match error {
            Error::NotSupported(message) => Error::NotSupported(message),
            error => Error::invalid(format!("compressed unit ({})", error)),
        })
    }

    /// Compress the bytes of one unit.
    pub fn compress(self, unit_bytes: Bytes<'_>) -> Result<ByteVec> {
        match self {
            Compression::Store => Ok(unit_bytes.to_vec()),
            Compression::Zlib => zip::compress_zlib(unit_bytes),
            Compression::Deflate => zip::compress_deflate(unit_bytes),

            #[cfg(feature = "brotli")]
            Compression::Brotli => self::brotli::compress(unit_bytes),

            #[cfg(not(feature = "brotli"))]
            Compression::Brotli => Err(Error::unsupported(
                "brotli compressed units (the `brotli` feature is disabled)"
            )),
        }
    }
}


/// One independently decompressible span within the compressed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompressedUnit {

    /// Byte offset of this unit within the payload.
    pub offset: u64,

    /// Compressed byte count of this unit.
    pub size: u64,
}

/// How the compressed units partition the image payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitGranularity {

    /// The units concatenate to the whole image payload.
    /// Requests for a byte range must decompress the units
    /// and slice the requested range out of the plaintext.
    WholeImage,

    /// One unit per tile, in tile index order.
    PerTile,
}

/// The ordered table of compressed units of one image payload,
/// read once from the container and cached for the item's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedUnitTable {
    pub method: Compression,
    pub granularity: UnitGranularity,
    pub units: Vec<CompressedUnit>,
}

impl CompressedUnitTable {

    /// A single unit spanning the whole payload.
    pub fn single_unit(method: Compression, payload_size: u64) -> Self {
        CompressedUnitTable {
            method,
            granularity: UnitGranularity::WholeImage,
            units: vec![CompressedUnit { offset: 0, size: payload_size }],
        }
    }
}
