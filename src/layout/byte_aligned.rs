
//! Component interleave restricted to whole-word samples of one, two,
//! four, eight or sixteen bytes. Samples are read and written as machine
//! words with the declared byte order, skipping the bit-level shifting
//! used by the other families. Sixteen-byte samples are complex pairs
//! of two eight-byte halves.

use lebe::prelude::*;

use crate::error::{Error, Result, UnitResult};
use crate::image::{PlaneView, PlaneViewMut};
use crate::math::{align_to, Vec2};
use crate::meta::LayoutDescription;
use super::ChannelEntry;


/// Serialized size of one tile.
pub(crate) fn tile_size(layout: &LayoutDescription, entries: &[ChannelEntry]) -> u64 {
    let total: u64 = entries.iter()
        .map(|entry| {
            let row_bytes = align_to(
                u64::from(entry.aligned_bytes_per_sample) * u64::from(entry.tile_width),
                layout.row_align_size(),
            );
            row_bytes * u64::from(entry.tile_height)
        })
        .sum();

    align_to(total, layout.tile_align_size())
}


/// Decode one word from the source with the declared byte order
/// into native-endian destination bytes.
fn decode_sample(source: &[u8], little_endian: bool, native: &mut [u8]) -> UnitResult {
    let mut read = source;

    match native.len() {
        1 => native[0] = source[0],

        2 => {
            let value: u16 = if little_endian { u16::read_from_little_endian(&mut read)? }
                else { u16::read_from_big_endian(&mut read)? };
            native.copy_from_slice(&value.to_ne_bytes());
        },

        4 => {
            let value: u32 = if little_endian { u32::read_from_little_endian(&mut read)? }
                else { u32::read_from_big_endian(&mut read)? };
            native.copy_from_slice(&value.to_ne_bytes());
        },

        8 => {
            let value: u64 = if little_endian { u64::read_from_little_endian(&mut read)? }
                else { u64::read_from_big_endian(&mut read)? };
            native.copy_from_slice(&value.to_ne_bytes());
        },

        // a complex pair of two eight-byte halves
        16 => {
            decode_sample(&source[.. 8], little_endian, &mut native[.. 8])?;
            decode_sample(&source[8 ..], little_endian, &mut native[8 ..])?;
        },

        _ => return Err(Error::bug("unexpected sample word width")),
    }

    Ok(())
}

/// Serialize native-endian sample bytes with the declared byte order.
fn encode_sample(native: &[u8], little_endian: bool, out: &mut Vec<u8>) -> UnitResult {
    match native.len() {
        1 => out.push(native[0]),

        2 => {
            let value = u16::from_ne_bytes([native[0], native[1]]);
            if little_endian { out.write_as_little_endian(&value)?; }
            else { out.write_as_big_endian(&value)?; }
        },

        4 => {
            let value = u32::from_ne_bytes([native[0], native[1], native[2], native[3]]);
            if little_endian { out.write_as_little_endian(&value)?; }
            else { out.write_as_big_endian(&value)?; }
        },

        8 => {
            let mut bytes = [0_u8; 8];
            bytes.copy_from_slice(native);
            let value = u64::from_ne_bytes(bytes);
            if little_endian { out.write_as_little_endian(&value)?; }
            else { out.write_as_big_endian(&value)?; }
        },

        16 => {
            encode_sample(&native[.. 8], little_endian, out)?;
            encode_sample(&native[8 ..], little_endian, out)?;
        },

        _ => return Err(Error::bug("unexpected sample word width")),
    }

    Ok(())
}


pub(crate) fn decode_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &mut [PlaneViewMut<'_>],
    bytes: &[u8],
    place: Vec2<u32>,
) -> UnitResult
{
    let little_endian = layout.components_little_endian();
    let mut position = 0_usize;

    for entry in entries {
        let sample_bytes = entry.bytes_per_sample as usize;
        let aligned_bytes = entry.aligned_bytes_per_sample as usize;
        let row_bytes = align_to(
            aligned_bytes as u64 * u64::from(entry.tile_width),
            layout.row_align_size(),
        ) as usize;

        let mut native = [0_u8; 16];
        let native = &mut native[.. sample_bytes];

        for y in 0 .. entry.tile_height {
            let row_start = position;

            for x in 0 .. entry.tile_width {
                let source = bytes.get(position .. position + sample_bytes)
                    .ok_or_else(|| Error::invalid("unexpected end of pixel data"))?;

                if let Some(plane) = entry.plane {
                    decode_sample(source, little_endian, native)?;

                    views[plane].put_sample_bytes(
                        place.0 * entry.tile_width + x,
                        place.1 * entry.tile_height + y,
                        native,
                    )?;
                }

                position += aligned_bytes;
            }

            position = row_start + row_bytes;
        }
    }

    Ok(())
}

pub(crate) fn encode_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &[PlaneView<'_>],
    place: Vec2<u32>,
) -> Result<Vec<u8>>
{
    let little_endian = layout.components_little_endian();
    let mut out = Vec::new();

    for entry in entries {
        let sample_bytes = entry.bytes_per_sample as usize;
        let aligned_bytes = entry.aligned_bytes_per_sample as usize;
        let row_bytes = align_to(
            aligned_bytes as u64 * u64::from(entry.tile_width),
            layout.row_align_size(),
        ) as usize;

        let zeroes = [0_u8; 16];

        for y in 0 .. entry.tile_height {
            let row_start = out.len();

            for x in 0 .. entry.tile_width {
                let native = match entry.plane {
                    Some(plane) => views[plane].get_sample_bytes(
                        place.0 * entry.tile_width + x,
                        place.1 * entry.tile_height + y,
                    )?,
                    None => &zeroes[.. sample_bytes],
                };

                encode_sample(native, little_endian, &mut out)?;
                out.resize(out.len() + (aligned_bytes - sample_bytes), 0);
            }

            out.resize(row_start + row_bytes, 0);
        }
    }

    let total = align_to(out.len() as u64, layout.tile_align_size());
    out.resize(total as usize, 0);
    Ok(out)
}
