
//! Pixel interleave: all components of one pixel are serialized
//! contiguously before the next pixel begins. Components are emitted in
//! declared order, each optionally padded to its component alignment;
//! the pixel is then padded to the declared pixel size.

use crate::error::{Result, UnitResult};
use crate::image::{PlaneView, PlaneViewMut};
use crate::io::{BitReader, BitWriter};
use crate::math::{align_to, bits_to_bytes, Vec2};
use crate::meta::LayoutDescription;
use super::ChannelEntry;


/// Serialized size of one pixel-interleaved tile. Walks the bit layout
/// of one row, since per-component alignment skips depend on the
/// running position within the row.
pub(crate) fn tile_size(layout: &LayoutDescription, entries: &[ChannelEntry]) -> Result<u64> {
    let mut bit_position: u64 = 0;

    for _ in 0 .. layout.tile_width() {
        let pixel_start_byte = bits_to_bytes(bit_position);

        for entry in entries {
            if entry.align_size != 0 {
                bit_position = bits_to_bytes(bit_position) * 8; // skip to byte boundary
                bit_position += u64::from(entry.pad_bits);
            }

            bit_position += u64::from(entry.bit_depth);
        }

        if layout.pixel_size() != 0 {
            let bytes_in_pixel = bits_to_bytes(bit_position) - pixel_start_byte;
            let padding = u64::from(layout.pixel_size()).checked_sub(bytes_in_pixel)
                .ok_or_else(|| crate::error::Error::invalid(
                    "pixel data larger than its declared pixel size"
                ))?;

            bit_position = (bits_to_bytes(bit_position) + padding) * 8;
        }
    }

    let row_bytes = align_to(bits_to_bytes(bit_position), layout.row_align_size());
    let tile_bytes = row_bytes * u64::from(layout.tile_height());

    Ok(align_to(tile_bytes, layout.tile_align_size()))
}


pub(crate) fn decode_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &mut [PlaneViewMut<'_>],
    bytes: &[u8],
    place: Vec2<u32>,
) -> UnitResult
{
    let mut bits = BitReader::new(bytes);

    for y in 0 .. layout.tile_height() {
        bits.mark_row_start();

        for x in 0 .. layout.tile_width() {
            bits.mark_pixel_start();

            for entry in entries {
                if entry.align_size != 0 {
                    bits.skip_to_byte_boundary();
                    bits.skip_bits(entry.pad_bits as usize)?;
                }

                match entry.plane {
                    Some(plane) => {
                        let value = bits.read_bits(entry.bit_depth as usize)?;
                        views[plane].put_sample(
                            place.0 * entry.tile_width + x,
                            place.1 * entry.tile_height + y,
                            value,
                        )?;
                    },
                    None => bits.skip_bits(entry.bit_depth as usize)?,
                }
            }

            bits.pad_to_pixel_size(layout.pixel_size())?;
        }

        bits.pad_to_row_alignment(layout.row_align_size())?;
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
    let mut bits = BitWriter::new();
    bits.mark_tile_start();

    for y in 0 .. layout.tile_height() {
        bits.mark_row_start();

        for x in 0 .. layout.tile_width() {
            bits.mark_pixel_start();

            for entry in entries {
                if entry.align_size != 0 {
                    bits.align_to_byte_boundary();
                    bits.write_bits(0, entry.pad_bits as usize);
                }

                let value = match entry.plane {
                    Some(plane) => views[plane].get_sample(
                        place.0 * entry.tile_width + x,
                        place.1 * entry.tile_height + y,
                    )?,
                    None => 0,
                };

                bits.write_bits(value, entry.bit_depth as usize);
            }

            bits.pad_to_pixel_size(layout.pixel_size())?;
        }

        bits.pad_to_row_alignment(layout.row_align_size());
    }

    bits.pad_to_tile_alignment(layout.tile_align_size());
    Ok(bits.into_bytes())
}
