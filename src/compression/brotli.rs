
//! Brotli units, via the pure-rust `brotli` crate.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use super::ByteVec;

const BUFFER_SIZE: usize = 4096;


pub fn decompress(data: &[u8]) -> Result<ByteVec> {
    let mut decompressed = Vec::new();

    brotli::Decompressor::new(data, BUFFER_SIZE)
        .read_to_end(&mut decompressed)
        .map_err(|_| Error::invalid("brotli-compressed data malformed"))?;

    Ok(decompressed)
}

pub fn compress(data: &[u8]) -> Result<ByteVec> {
    let mut compressed = Vec::new();

    let mut writer = brotli::CompressorWriter::new(&mut compressed, BUFFER_SIZE, 5, 22);
    writer.write_all(data).map_err(|_| Error::bug("in-memory compression failed"))?;
    drop(writer); // flushes the remaining bytes

    Ok(compressed)
}
