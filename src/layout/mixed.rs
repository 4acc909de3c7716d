
//! Mixed interleave: luma-family components are serialized row by row,
//! while the Cb/Cr pair is serialized pixel-interleaved with each other
//! at the subsampled resolution. Both chroma planes are filled in the
//! same pass, exactly once per tile, even though both chroma components
//! are visited.

use crate::error::{Result, UnitResult};
use crate::image::{PlaneView, PlaneViewMut};
use crate::io::{BitReader, BitWriter};
use crate::math::{align_to, Vec2};
use crate::meta::LayoutDescription;
use super::{decode_component_row, encode_component_row, ChannelEntry};


fn is_chroma(entry: &ChannelEntry) -> bool {
    entry.channel.map_or(false, |channel| channel.is_chroma())
}

/// Serialized size of one mixed-interleaved tile.
/// Chroma samples are whole bytes; row alignment does not apply here.
pub(crate) fn tile_size(layout: &LayoutDescription, entries: &[ChannelEntry]) -> u64 {
    let mut total_bytes: u64 = 0;
    let mut chroma_counted = false;

    for entry in entries {
        if is_chroma(entry) {
            if !chroma_counted {
                chroma_counted = true;
                total_bytes += u64::from(entry.tile_width) * u64::from(entry.tile_height)
                    * 2 * u64::from(entry.bytes_per_sample);
            }
        }
        else {
            total_bytes += entry.row_bytes(0) * u64::from(entry.tile_height);
        }
    }

    align_to(total_bytes, layout.tile_align_size())
}


pub(crate) fn decode_tile(
    _layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &mut [PlaneViewMut<'_>],
    bytes: &[u8],
    place: Vec2<u32>,
) -> UnitResult
{
    let mut bits = BitReader::new(bytes);
    let mut chroma_processed = false;

    for entry in entries {
        if is_chroma(entry) {
            if chroma_processed { continue; }
            chroma_processed = true;

            let sample_bits = entry.bytes_per_sample as usize * 8;

            for y in 0 .. entry.tile_height {
                for x in 0 .. entry.tile_width {
                    let first = bits.read_bits(sample_bits)?;
                    let second = bits.read_bits(sample_bits)?;

                    let dst_x = place.0 * entry.tile_width + x;
                    let dst_y = place.1 * entry.tile_height + y;

                    if let Some(plane) = entry.plane {
                        views[plane].put_sample(dst_x, dst_y, first)?;
                    }
                    if let Some(partner) = entry.partner_plane {
                        views[partner].put_sample(dst_x, dst_y, second)?;
                    }
                }
            }
        }
        else {
            for y in 0 .. entry.tile_height {
                decode_component_row(
                    entry, &mut bits, views,
                    place.0 * entry.tile_width,
                    place.1 * entry.tile_height + y,
                )?;
            }
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
    let mut bits = BitWriter::new();
    bits.mark_tile_start();

    let mut chroma_processed = false;

    for entry in entries {
        if is_chroma(entry) {
            if chroma_processed { continue; }
            chroma_processed = true;

            let sample_bits = entry.bytes_per_sample as usize * 8;

            for y in 0 .. entry.tile_height {
                for x in 0 .. entry.tile_width {
                    let src_x = place.0 * entry.tile_width + x;
                    let src_y = place.1 * entry.tile_height + y;

                    let first = match entry.plane {
                        Some(plane) => views[plane].get_sample(src_x, src_y)?,
                        None => 0,
                    };

                    let second = match entry.partner_plane {
                        Some(partner) => views[partner].get_sample(src_x, src_y)?,
                        None => 0,
                    };

                    bits.write_bits(first, sample_bits);
                    bits.write_bits(second, sample_bits);
                }
            }
        }
        else {
            for y in 0 .. entry.tile_height {
                encode_component_row(
                    entry, &mut bits, views,
                    place.0 * entry.tile_width,
                    place.1 * entry.tile_height + y,
                )?;
            }
        }
    }

    bits.pad_to_tile_alignment(layout.tile_align_size());
    Ok(bits.into_bytes())
}
