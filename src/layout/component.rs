
//! Component interleave: one component's full per-tile sample grid after
//! another's. Also covers the tile-component arrangement, which stores
//! every (component, tile) block as an independently addressable unit
//! and aligns each of those blocks separately.

use smallvec::SmallVec;

use crate::error::{Result, UnitResult};
use crate::image::{PlaneView, PlaneViewMut};
use crate::io::{BitReader, BitWriter};
use crate::math::{align_to, Vec2};
use crate::meta::LayoutDescription;
use super::{decode_component_row, encode_component_row, ChannelEntry};


/// Byte size of one component's block of one tile,
/// including row alignment but not tile alignment.
fn component_block_bytes(entry: &ChannelEntry, row_align_size: u32) -> u64 {
    entry.row_bytes(row_align_size) * u64::from(entry.tile_height)
}

/// Serialized size of one contiguous component-interleaved tile.
pub(crate) fn tile_size(layout: &LayoutDescription, entries: &[ChannelEntry]) -> u64 {
    let total: u64 = entries.iter()
        .map(|entry| component_block_bytes(entry, layout.row_align_size()))
        .sum();

    align_to(total, layout.tile_align_size())
}

/// Serialized sizes of the per-component blocks of one tile,
/// each aligned on its own.
pub(crate) fn per_component_tile_sizes(
    layout: &LayoutDescription, entries: &[ChannelEntry],
) -> SmallVec<[u64; 4]>
{
    entries.iter()
        .map(|entry| align_to(
            component_block_bytes(entry, layout.row_align_size()),
            layout.tile_align_size(),
        ))
        .collect()
}


pub(crate) fn decode_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &mut [PlaneViewMut<'_>],
    bytes: &[u8],
    place: Vec2<u32>,
    per_component_tile_align: bool,
) -> UnitResult
{
    let mut bits = BitReader::new(bytes);

    for entry in entries {
        bits.mark_tile_start();

        for y in 0 .. entry.tile_height {
            bits.mark_row_start();

            decode_component_row(
                entry, &mut bits, views,
                place.0 * entry.tile_width,
                place.1 * entry.tile_height + y,
            )?;

            bits.pad_to_row_alignment(layout.row_align_size())?;
        }

        if per_component_tile_align {
            bits.pad_to_tile_alignment(layout.tile_align_size())?;
        }
    }

    Ok(())
}

pub(crate) fn encode_tile(
    layout: &LayoutDescription,
    entries: &[ChannelEntry],
    views: &[PlaneView<'_>],
    place: Vec2<u32>,
    per_component_tile_align: bool,
) -> Result<Vec<u8>>
{
    let mut bits = BitWriter::new();

    if per_component_tile_align {
        for entry in entries {
            bits.mark_tile_start();
            encode_component_block(layout, entry, &mut bits, views, place)?;
            bits.pad_to_tile_alignment(layout.tile_align_size());
        }
    }
    else {
        // the whole tile is aligned as one, starting at byte zero
        bits.mark_tile_start();

        for entry in entries {
            encode_component_block(layout, entry, &mut bits, views, place)?;
        }

        bits.pad_to_tile_alignment(layout.tile_align_size());
    }

    Ok(bits.into_bytes())
}

/// Serialize one component's rows of one tile.
fn encode_component_block(
    layout: &LayoutDescription,
    entry: &ChannelEntry,
    bits: &mut BitWriter,
    views: &[PlaneView<'_>],
    place: Vec2<u32>,
) -> UnitResult
{
    for y in 0 .. entry.tile_height {
        bits.mark_row_start();

        encode_component_row(
            entry, bits, views,
            place.0 * entry.tile_width,
            place.1 * entry.tile_height + y,
        )?;

        bits.pad_to_row_alignment(layout.row_align_size());
    }

    Ok(())
}


/// Decode one single component's block, as fetched on its own
/// from a tile-component arrangement.
pub(crate) fn decode_component_block(
    layout: &LayoutDescription,
    entry: &ChannelEntry,
    views: &mut [PlaneViewMut<'_>],
    bytes: &[u8],
    place: Vec2<u32>,
) -> UnitResult
{
    let mut bits = BitReader::new(bytes);
    bits.mark_tile_start();

    for y in 0 .. entry.tile_height {
        bits.mark_row_start();

        decode_component_row(
            entry, &mut bits, views,
            place.0 * entry.tile_width,
            place.1 * entry.tile_height + y,
        )?;

        bits.pad_to_row_alignment(layout.row_align_size())?;
    }

    Ok(())
}

