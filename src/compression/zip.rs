
//! Zlib and raw deflate units.
//! Decompresses with `zune-inflate`, compresses with `miniz_oxide`.

use crate::error::{Error, Result};
use super::ByteVec;


pub fn decompress_zlib(data: &[u8]) -> Result<ByteVec> {
    zune_inflate::DeflateDecoder::new(data)
        .decode_zlib()
        .map_err(|_| Error::invalid("zlib-compressed data malformed"))
}

pub fn decompress_deflate(data: &[u8]) -> Result<ByteVec> {
    zune_inflate::DeflateDecoder::new(data)
        .decode_deflate()
        .map_err(|_| Error::invalid("deflate-compressed data malformed"))
}

pub fn compress_zlib(data: &[u8]) -> Result<ByteVec> {
    Ok(miniz_oxide::deflate::compress_to_vec_zlib(data, 6))
}

pub fn compress_deflate(data: &[u8]) -> Result<ByteVec> {
    Ok(miniz_oxide::deflate::compress_to_vec(data, 6))
}
