
//! The packed-block layout variants. A block is a little- or big-endian
//! integer of up to eight bytes; components are extracted from it by bit
//! range rather than by byte-by-byte reads, which matters when components
//! are not individually byte-aligned within the block.
//!
//! Block-component interleave stores exactly one component per block,
//! component interleaved. Block-pixel interleave packs all components of
//! one pixel into a single block.

use bit_field::BitField;

use crate::error::{Error, Result, UnitResult};
use crate::image::{PlaneView, PlaneViewMut};
use crate::math::{align_to, Vec2};
use crate::meta::LayoutDescription;
use super::ChannelEntry;


/// Read one block as an integer, honoring the declared byte order.
fn read_block(bytes: &[u8], little_endian: bool) -> u64 {
    if little_endian {
        bytes.iter().rev().fold(0_u64, |value, &byte| (value << 8) | u64::from(byte))
    }
    else {
        bytes.iter().fold(0_u64, |value, &byte| (value << 8) | u64::from(byte))
    }
}

/// Serialize one block integer into `block_size` bytes.
fn write_block(value: u64, block_size: usize, little_endian: bool, out: &mut Vec<u8>) {
    if little_endian {
        out.extend_from_slice(&value.to_le_bytes()[.. block_size]);
    }
    else {
        out.extend_from_slice(&value.to_be_bytes()[8 - block_size ..]);
    }
}

/// The bit positions of every component within a block-pixel block,
/// from the least significant end.
fn pixel_block_shifts(layout: &LayoutDescription, entries: &[ChannelEntry], block_bits: usize) -> Vec<usize> {
    let count = entries.len();
    let mut shifts = vec![0_usize; count];

    if layout.block_pad_lsb() {
        // padding occupies the least significant end,
        // the first emitted component the most significant
        let mut bit_offset = block_bits;
        for position in 0 .. count {
            let index = if layout.block_reversed() { count - 1 - position } else { position };
            bit_offset -= entries[index].bit_depth as usize;
            shifts[index] = bit_offset;
        }
    }
    else {
        let mut bit_offset = 0;
        for position in 0 .. count {
            let index = if layout.block_reversed() { count - 1 - position } else { position };
            shifts[index] = bit_offset;
            bit_offset += entries[index].bit_depth as usize;
        }
    }

    shifts
}


// --- block-component interleave ---

pub(crate) fn component_tile_size(layout: &LayoutDescription, entries: &[ChannelEntry]) -> u64 {
    let block_size = u64::from(layout.block_size());
    let row_bytes = align_to(block_size * u64::from(layout.tile_width()), layout.row_align_size());

    let total = row_bytes * u64::from(layout.tile_height()) * entries.len() as u64;
    align_to(total, layout.tile_align_size())
}

pub(crate) fn decode_component_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &mut [PlaneViewMut<'_>],
    bytes: &[u8],
    place: Vec2<u32>,
) -> UnitResult
{
    let block_size = layout.block_size() as usize;
    let block_bits = block_size * 8;
    let row_bytes = align_to(
        block_size as u64 * u64::from(layout.tile_width()),
        layout.row_align_size(),
    ) as usize;

    let mut position = 0_usize;

    for entry in entries {
        // one component per block, so the shift only depends on the padding
        let shift = if layout.block_pad_lsb() { block_bits - entry.bit_depth as usize } else { 0 };

        for y in 0 .. entry.tile_height {
            let row_start = position;

            for x in 0 .. entry.tile_width {
                let block_bytes = bytes.get(position .. position + block_size)
                    .ok_or_else(|| Error::invalid("unexpected end of pixel data"))?;

                if let Some(plane) = entry.plane {
                    let block = read_block(block_bytes, layout.block_little_endian());
                    let value = block.get_bits(shift .. shift + entry.bit_depth as usize);

                    views[plane].put_sample(
                        place.0 * entry.tile_width + x,
                        place.1 * entry.tile_height + y,
                        value,
                    )?;
                }

                position += block_size;
            }

            position = row_start + row_bytes;
        }
    }

    Ok(())
}

pub(crate) fn encode_component_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &[PlaneView<'_>],
    place: Vec2<u32>,
) -> Result<Vec<u8>>
{
    let block_size = layout.block_size() as usize;
    let block_bits = block_size * 8;
    let row_bytes = align_to(
        block_size as u64 * u64::from(layout.tile_width()),
        layout.row_align_size(),
    ) as usize;

    let mut out = Vec::new();

    for entry in entries {
        let shift = if layout.block_pad_lsb() { block_bits - entry.bit_depth as usize } else { 0 };
        let mask = (1_u64 << entry.bit_depth) - 1;

        for y in 0 .. entry.tile_height {
            let row_start = out.len();

            for x in 0 .. entry.tile_width {
                let value = match entry.plane {
                    Some(plane) => views[plane].get_sample(
                        place.0 * entry.tile_width + x,
                        place.1 * entry.tile_height + y,
                    )? & mask,
                    None => 0,
                };

                let mut block = 0_u64;
                block.set_bits(shift .. shift + entry.bit_depth as usize, value);
                write_block(block, block_size, layout.block_little_endian(), &mut out);
            }

            out.resize(row_start + row_bytes, 0);
        }
    }

    let total = align_to(out.len() as u64, layout.tile_align_size());
    out.resize(total as usize, 0);
    Ok(out)
}


// --- block-pixel interleave ---

fn effective_block_size(layout: &LayoutDescription) -> usize {
    if layout.block_size() == 0 { layout.pixel_size() as usize }
    else { layout.block_size() as usize }
}

pub(crate) fn pixel_tile_size(layout: &LayoutDescription) -> u64 {
    let row_bytes = align_to(
        u64::from(layout.tile_width()) * u64::from(layout.pixel_size()),
        layout.row_align_size(),
    );

    let total = row_bytes * u64::from(layout.tile_height());
    align_to(total, layout.tile_align_size())
}

pub(crate) fn decode_pixel_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &mut [PlaneViewMut<'_>],
    bytes: &[u8],
    place: Vec2<u32>,
) -> UnitResult
{
    let block_size = effective_block_size(layout);
    let pixel_size = layout.pixel_size() as usize;
    let row_bytes = align_to(
        u64::from(layout.tile_width()) * pixel_size as u64,
        layout.row_align_size(),
    ) as usize;

    let shifts = pixel_block_shifts(layout, entries, block_size * 8);

    for y in 0 .. layout.tile_height() {
        let row_start = y as usize * row_bytes;

        for x in 0 .. layout.tile_width() {
            let pixel_start = row_start + x as usize * pixel_size;

            let block_bytes = bytes.get(pixel_start .. pixel_start + block_size)
                .ok_or_else(|| Error::invalid("unexpected end of pixel data"))?;

            let block = read_block(block_bytes, layout.block_little_endian());

            for (entry, &shift) in entries.iter().zip(&shifts) {
                if let Some(plane) = entry.plane {
                    let value = block.get_bits(shift .. shift + entry.bit_depth as usize);

                    views[plane].put_sample(
                        place.0 * entry.tile_width + x,
                        place.1 * entry.tile_height + y,
                        value,
                    )?;
                }
            }
        }
    }

    Ok(())
}

pub(crate) fn encode_pixel_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &[PlaneView<'_>],
    place: Vec2<u32>,
) -> Result<Vec<u8>>
{
    let block_size = effective_block_size(layout);
    let pixel_size = layout.pixel_size() as usize;
    let row_bytes = align_to(
        u64::from(layout.tile_width()) * pixel_size as u64,
        layout.row_align_size(),
    ) as usize;

    let shifts = pixel_block_shifts(layout, entries, block_size * 8);
    let mut out = Vec::new();

    for y in 0 .. layout.tile_height() {
        let row_start = out.len();

        for x in 0 .. layout.tile_width() {
            let mut block = 0_u64;

            for (entry, &shift) in entries.iter().zip(&shifts) {
                let value = match entry.plane {
                    Some(plane) => {
                        let mask = (1_u64 << entry.bit_depth) - 1;
                        views[plane].get_sample(
                            place.0 * entry.tile_width + x,
                            place.1 * entry.tile_height + y,
                        )? & mask
                    },
                    None => 0,
                };

                block.set_bits(shift .. shift + entry.bit_depth as usize, value);
            }

            write_block(block, block_size, layout.block_little_endian(), &mut out);
            out.resize(out.len() + (pixel_size - block_size), 0);
        }

        out.resize(row_start + row_bytes, 0);
    }

    let total = align_to(out.len() as u64, layout.tile_align_size());
    out.resize(total as usize, 0);
    Ok(out)
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn block_byte_orders(){
        assert_eq!(read_block(&[0x12, 0x34], false), 0x1234);
        assert_eq!(read_block(&[0x12, 0x34], true), 0x3412);

        let mut out = Vec::new();
        write_block(0x1234, 2, false, &mut out);
        write_block(0x1234, 2, true, &mut out);
        assert_eq!(out, [0x12, 0x34, 0x34, 0x12]);
    }
}
