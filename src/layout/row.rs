
//! Row interleave: within each row of a tile, one component's samples
//! after another's, each component's segment row-scoped rather than
//! per-pixel. The whole row is padded to the row alignment.

use crate::error::{Result, UnitResult};
use crate::image::{PlaneView, PlaneViewMut};
use crate::io::{BitReader, BitWriter};
use crate::math::{align_to, Vec2};
use crate::meta::LayoutDescription;
use super::{decode_component_row, encode_component_row, ChannelEntry};


/// Serialized size of one row-interleaved tile.
pub(crate) fn tile_size(layout: &LayoutDescription, entries: &[ChannelEntry]) -> u64 {
    // every component segment ends on a byte boundary,
    // the row as a whole is then padded to the row alignment
    let segment_bytes: u64 = entries.iter()
        .map(|entry| entry.row_bytes(0))
        .sum();

    let row_bytes = align_to(segment_bytes, layout.row_align_size());
    let tile_bytes = row_bytes * u64::from(layout.tile_height());

    align_to(tile_bytes, layout.tile_align_size())
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

        for entry in entries {
            decode_component_row(
                entry, &mut bits, views,
                place.0 * entry.tile_width,
                place.1 * entry.tile_height + y,
            )?;
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

        for entry in entries {
            encode_component_row(
                entry, &mut bits, views,
                place.0 * entry.tile_width,
                place.1 * entry.tile_height + y,
            )?;
        }

        bits.pad_to_row_alignment(layout.row_align_size());
    }

    bits.pad_to_tile_alignment(layout.tile_align_size());
    Ok(bits.into_bytes())
}
