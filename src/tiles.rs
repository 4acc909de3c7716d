
//! Tile-grid iteration and byte-range orchestration: computes where each
//! tile lives inside the payload, materializes its plaintext bytes
//! (decompressing generic compression units where active), and drives the
//! selected layout family over every requested tile.
//!
//! Decoding a full image iterates tiles in row-major order; tiles write to
//! disjoint regions of the destination planes and carry no shared mutable
//! state, so unit decompression may run on a thread pool while the plane
//! writes stay sequential.

use smallvec::SmallVec;

use crate::compression::{ByteVec, Compression, CompressedUnit, CompressedUnitTable, UnitGranularity};
use crate::error::{u64_to_usize, Error, Result, UnitResult};
use crate::image::PlaneSet;
use crate::layout::{channel_entries, ChannelEntry, LayoutFamily};
use crate::math::Vec2;
use crate::meta::LayoutDescription;
use crate::meta::component::Channel;


/// Provides the payload bytes of one image item. May be backed by memory,
/// a file, or a streaming range reader; reads are synchronous and this
/// crate only ever requests ranges inside [`Self::total_size`].
pub trait ByteSource: Sync {

    /// Total byte count of the item payload.
    fn total_size(&self) -> u64;

    /// Read the specified range. Must return exactly `length` bytes.
    fn read(&self, offset: u64, length: u64) -> Result<ByteVec>;
}

impl ByteSource for [u8] {
    fn total_size(&self) -> u64 { self.len() as u64 }

    fn read(&self, offset: u64, length: u64) -> Result<ByteVec> {
        let start = u64_to_usize(offset)?;
        let end = start.checked_add(u64_to_usize(length)?)
            .ok_or_else(|| Error::invalid("byte range overflows"))?;

        self.get(start .. end)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::invalid("byte range outside of the payload"))
    }
}


/// Which part of the image to decode.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeRegion {

    /// Decode every tile into one full-size plane set.
    FullImage,

    /// Decode the single tile at the specified grid position
    /// into a tile-size plane set.
    Tile {
        column: u32,
        row: u32,
    },
}


/// Accepts the serialized payload on encode. The append/patch split exists
/// because uncompressed layouts are preallocated and patched tile by tile,
/// while compressed units are appended sequentially.
pub trait PayloadStore {

    /// Append bytes at the end, returning the offset they were placed at.
    fn append(&mut self, bytes: &[u8]) -> Result<u64>;

    /// Overwrite previously appended bytes at the specified offset.
    fn patch(&mut self, offset: u64, bytes: &[u8]) -> UnitResult;
}

impl PayloadStore for Vec<u8> {
    fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.len() as u64;
        self.extend_from_slice(bytes);
        Ok(offset)
    }

    fn patch(&mut self, offset: u64, bytes: &[u8]) -> UnitResult {
        let start = u64_to_usize(offset)?;
        let end = start + bytes.len();

        self.get_mut(start .. end)
            .ok_or_else(|| Error::invalid("patch outside of the payload"))?
            .copy_from_slice(bytes);

        Ok(())
    }
}


/// Decode the requested region of the image described by `layout` from the
/// payload bytes of `source`, optionally wrapped in generic compression
/// units. Returns freshly allocated planes; a failed tile fails the whole
/// call and no planes are returned.
pub fn decode_region<S: ByteSource + ?Sized>(
    layout: &LayoutDescription,
    source: &S,
    units: Option<&CompressedUnitTable>,
    region: DecodeRegion,
) -> Result<PlaneSet>
{
    if let Some(table) = units {
        validate_unit_table(layout, source, table)?;
    }

    let family = layout.family();
    let sizes = family.tile_data_sizes(layout)?;

    match region {
        DecodeRegion::FullImage => {
            let mut planes = PlaneSet::allocate(layout)?;
            let entries = entries_for(layout, &planes);

            let mut reader = PayloadReader::new(source, units);
            reader.prepare_tile_units()?;

            let mut views = planes.views_mut();

            for tile_row in 0 .. layout.tile_rows() {
                for tile_column in 0 .. layout.tile_columns() {
                    let tile_index = layout.tile_index(tile_column, tile_row);
                    let bytes = reader.tile_bytes(layout, &sizes, tile_index)?;

                    family.decode_tile(
                        layout, &entries, &mut views,
                        &bytes, Vec2(tile_column, tile_row),
                    )?;
                }
            }

            drop(views);
            Ok(planes)
        },

        DecodeRegion::Tile { column, row } => {
            if column >= layout.tile_columns() || row >= layout.tile_rows() {
                return Err(Error::invalid("tile position outside of the tile grid"));
            }

            let mut planes = PlaneSet::allocate_tile(layout)?;
            let entries = entries_for(layout, &planes);

            let mut reader = PayloadReader::new(source, units);
            let tile_index = layout.tile_index(column, row);
            let bytes = reader.tile_bytes(layout, &sizes, tile_index)?;

            let mut views = planes.views_mut();
            family.decode_tile(layout, &entries, &mut views, &bytes, Vec2(0, 0))?;

            drop(views);
            Ok(planes)
        },
    }
}


/// Decode one single component of one tile of a tile-component arranged
/// image, touching only that component's bytes. Returns a tile-size plane
/// set in which only the requested component's plane carries data.
///
/// This is the defining use case of the tile-component arrangement:
/// without compression, exactly one byte-range read is issued.
pub fn decode_tile_component<S: ByteSource + ?Sized>(
    layout: &LayoutDescription,
    source: &S,
    units: Option<&CompressedUnitTable>,
    component_index: usize,
    column: u32, row: u32,
) -> Result<PlaneSet>
{
    if layout.family() != LayoutFamily::TileComponent {
        return Err(Error::invalid("selective component access requires the tile-component arrangement"));
    }

    if component_index >= layout.components().len() {
        return Err(Error::invalid("component index outside of the component list"));
    }

    if column >= layout.tile_columns() || row >= layout.tile_rows() {
        return Err(Error::invalid("tile position outside of the tile grid"));
    }

    if let Some(table) = units {
        validate_unit_table(layout, source, table)?;
    }

    let sizes = layout.family().tile_data_sizes(layout)?;
    let tile_index = layout.tile_index(column, row);

    // offset of this component's block within the tile's concatenated
    // blocks, and within the whole payload
    let before_component: u64 = sizes[.. component_index].iter().sum();
    let size = sizes[component_index];

    let mut planes = PlaneSet::allocate_tile(layout)?;
    let entries = entries_for(layout, &planes);

    let bytes = match units {
        Some(table) if table.granularity == UnitGranularity::PerTile => {
            // the tile's unit holds all of its component blocks
            let unit_plaintext = decompress_unit(source, table, tile_index as usize)?;

            unit_plaintext.get(u64_to_usize(before_component)? .. u64_to_usize(before_component + size)?)
                .map(<[u8]>::to_vec)
                .ok_or_else(|| Error::invalid("compressed unit smaller than its tile"))?
        },

        _ => {
            let tile_count = u64::from(layout.tile_count());
            let component_start: u64 = sizes[.. component_index].iter()
                .map(|&component_size| component_size * tile_count)
                .sum();

            let offset = component_start + size * u64::from(tile_index);
            PayloadReader::new(source, units).range_bytes(offset, size)?
        },
    };

    let mut views = planes.views_mut();
    crate::layout::decode_single_component_block(
        layout, &entries[component_index], &mut views, &bytes, Vec2(0, 0),
    )?;

    drop(views);
    Ok(planes)
}


/// Serialize all planes of the image into the payload store.
///
/// Without compression, the full payload is preallocated and every tile is
/// patched in place. With compression, each tile is compressed into one
/// unit and appended sequentially; the returned table records the units.
pub fn encode_image(
    layout: &LayoutDescription,
    planes: &PlaneSet,
    store: &mut impl PayloadStore,
    compression: Option<Compression>,
) -> Result<Option<CompressedUnitTable>>
{
    if planes.width() != layout.image_width() || planes.height() != layout.image_height() {
        return Err(Error::invalid("planes do not cover the described image"));
    }

    for channel in layout.used_channels() {
        if planes.plane(channel).is_none() {
            return Err(Error::invalid("missing a plane for a mapped channel"));
        }
    }

    let family = layout.family();
    let sizes = family.tile_data_sizes(layout)?;
    let tile_total: u64 = sizes.iter().sum();

    let entries = entries_for(layout, planes);
    let views = planes.views();

    match compression {
        None => {
            let payload_size = tile_total * u64::from(layout.tile_count());
            let base = store.append(&vec![0_u8; u64_to_usize(payload_size)?])?;

            for tile_row in 0 .. layout.tile_rows() {
                for tile_column in 0 .. layout.tile_columns() {
                    let tile_index = u64::from(layout.tile_index(tile_column, tile_row));

                    let data = family.encode_tile(
                        layout, &entries, &views, Vec2(tile_column, tile_row),
                    )?;

                    debug_assert_eq!(data.len() as u64, tile_total, "tile size formula mismatch");

                    if sizes.len() == 1 {
                        store.patch(base + sizes[0] * tile_index, &data)?;
                    }
                    else {
                        // scattered per-component blocks
                        let tile_count = u64::from(layout.tile_count());
                        let mut component_start = 0_u64;
                        let mut data_start = 0_usize;

                        for &size in sizes.iter() {
                            let block = &data[data_start .. data_start + u64_to_usize(size)?];
                            store.patch(base + component_start + size * tile_index, block)?;

                            component_start += size * tile_count;
                            data_start += block.len();
                        }
                    }
                }
            }

            Ok(None)
        },

        Some(method) => {
            let mut table_units = Vec::with_capacity(layout.tile_count() as usize);

            for tile_row in 0 .. layout.tile_rows() {
                for tile_column in 0 .. layout.tile_columns() {
                    let data = family.encode_tile(
                        layout, &entries, &views, Vec2(tile_column, tile_row),
                    )?;

                    debug_assert_eq!(data.len() as u64, tile_total, "tile size formula mismatch");

                    let compressed = method.compress(&data)?;
                    let offset = store.append(&compressed)?;
                    table_units.push(CompressedUnit { offset, size: compressed.len() as u64 });
                }
            }

            Ok(Some(CompressedUnitTable {
                method,
                granularity: UnitGranularity::PerTile,
                units: table_units,
            }))
        },
    }
}


/// The payload byte range of the specified tile, for the arrangements
/// that serialize each tile contiguously.
pub fn tile_payload_range(layout: &LayoutDescription, column: u32, row: u32) -> Result<(u64, u64)> {
    let sizes = layout.family().tile_data_sizes(layout)?;
    if sizes.len() != 1 {
        return Err(Error::invalid("this arrangement stores tiles as scattered per-component blocks"));
    }

    let size = sizes[0];
    Ok((size * u64::from(layout.tile_index(column, row)), size))
}

/// The payload byte range of one (component, tile) block
/// of a tile-component arranged image.
pub fn component_payload_range(
    layout: &LayoutDescription, component_index: usize, column: u32, row: u32,
) -> Result<(u64, u64)>
{
    if layout.family() != LayoutFamily::TileComponent {
        return Err(Error::invalid("selective component access requires the tile-component arrangement"));
    }

    let sizes = layout.family().tile_data_sizes(layout)?;
    let size = sizes[component_index];
    let tile_count = u64::from(layout.tile_count());

    let component_start: u64 = sizes[.. component_index].iter()
        .map(|&component_size| component_size * tile_count)
        .sum();

    Ok((component_start + size * u64::from(layout.tile_index(column, row)), size))
}

/// Total byte count of the uncompressed payload of this description.
pub fn total_payload_size(layout: &LayoutDescription) -> Result<u64> {
    let sizes = layout.family().tile_data_sizes(layout)?;
    let tile_total: u64 = sizes.iter().sum();
    Ok(tile_total * u64::from(layout.tile_count()))
}


fn entries_for(layout: &LayoutDescription, planes: &PlaneSet) -> SmallVec<[ChannelEntry; 4]> {
    let plane_channels: SmallVec<[Channel; 4]> = planes.planes().iter()
        .map(|plane| plane.channel()).collect();

    channel_entries(layout, &plane_channels)
}

fn validate_unit_table<S: ByteSource + ?Sized>(
    layout: &LayoutDescription, source: &S, table: &CompressedUnitTable,
) -> UnitResult
{
    if table.units.is_empty() {
        return Err(Error::invalid("empty compressed unit table"));
    }

    if table.granularity == UnitGranularity::PerTile
        && table.units.len() != layout.tile_count() as usize {
        return Err(Error::invalid("per-tile unit table does not match the tile count"));
    }

    let payload_size = source.total_size();
    for unit in &table.units {
        let end = unit.offset.checked_add(unit.size)
            .ok_or_else(|| Error::invalid("compressed unit range overflows"))?;

        if end > payload_size {
            return Err(Error::invalid("compressed unit outside of the payload"));
        }
    }

    Ok(())
}

fn read_unit<S: ByteSource + ?Sized>(source: &S, unit: &CompressedUnit) -> Result<ByteVec> {
    source.read(unit.offset, unit.size)
}

fn decompress_unit<S: ByteSource + ?Sized>(
    source: &S, table: &CompressedUnitTable, index: usize,
) -> Result<ByteVec>
{
    let unit = table.units.get(index)
        .ok_or_else(|| Error::invalid("no compressed unit for this tile"))?;

    table.method.decompress(&read_unit(source, unit)?)
}

/// Decompress every unit of the table, in table order.
fn decompress_all_units<S: ByteSource + ?Sized>(
    source: &S, table: &CompressedUnitTable,
) -> Result<Vec<ByteVec>>
{
    #[cfg(feature = "rayon")]
    {
        if table.units.len() > 1 {
            use rayon::prelude::*;

            return table.units.par_iter()
                .map(|unit| table.method.decompress(&read_unit(source, unit)?))
                .collect();
        }
    }

    table.units.iter()
        .map(|unit| table.method.decompress(&read_unit(source, unit)?))
        .collect()
}


/// Materializes tile byte ranges from the byte source,
/// decompressing generic compression units where active.
struct PayloadReader<'t, S: ByteSource + ?Sized> {
    source: &'t S,
    units: Option<&'t CompressedUnitTable>,

    /// Decompressed per-tile units, filled up front for full-image decoding.
    tile_plaintexts: Option<Vec<Option<ByteVec>>>,

    /// The plaintext of a whole-image unit table, decompressed once
    /// and sliced for every requested range.
    whole_plaintext: Option<ByteVec>,
}

impl<'t, S: ByteSource + ?Sized> PayloadReader<'t, S> {

    fn new(source: &'t S, units: Option<&'t CompressedUnitTable>) -> Self {
        PayloadReader { source, units, tile_plaintexts: None, whole_plaintext: None }
    }

    /// Decompress all per-tile units up front (in parallel where enabled).
    /// Does nothing for uncompressed payloads or whole-image units.
    fn prepare_tile_units(&mut self) -> UnitResult {
        if let Some(table) = self.units {
            if table.granularity == UnitGranularity::PerTile {
                let plaintexts = decompress_all_units(self.source, table)?;
                self.tile_plaintexts = Some(plaintexts.into_iter().map(Some).collect());
            }
        }

        Ok(())
    }

    /// The plaintext bytes of one whole tile (all component blocks
    /// concatenated, for the tile-component arrangement).
    fn tile_bytes(
        &mut self, layout: &LayoutDescription, sizes: &[u64], tile_index: u32,
    ) -> Result<ByteVec>
    {
        if let Some(table) = self.units {
            if table.granularity == UnitGranularity::PerTile {
                let expected: u64 = sizes.iter().sum();

                let mut plaintext = match &mut self.tile_plaintexts {
                    Some(cache) => cache.get_mut(tile_index as usize)
                        .and_then(Option::take)
                        .ok_or_else(|| Error::bug("tile unit already consumed"))?,

                    None => decompress_unit(self.source, table, tile_index as usize)?,
                };

                if (plaintext.len() as u64) < expected {
                    return Err(Error::invalid("compressed unit smaller than its tile"));
                }

                plaintext.truncate(u64_to_usize(expected)?);
                return Ok(plaintext);
            }
        }

        if sizes.len() == 1 {
            self.range_bytes(sizes[0] * u64::from(tile_index), sizes[0])
        }
        else {
            // scattered per-component blocks, one range per component
            let tile_count = u64::from(layout.tile_count());
            let total: u64 = sizes.iter().sum();
            let mut data = Vec::with_capacity(u64_to_usize(total)?);

            let mut component_start = 0_u64;
            for &size in sizes {
                let offset = component_start + size * u64::from(tile_index);
                data.extend_from_slice(&self.range_bytes(offset, size)?);
                component_start += size * tile_count;
            }

            Ok(data)
        }
    }

    /// A byte range of the uncompressed payload. For a whole-image unit
    /// table, decompresses every unit once and slices the requested range
    /// out of the concatenated plaintext.
    fn range_bytes(&mut self, offset: u64, size: u64) -> Result<ByteVec> {
        match self.units {
            None => {
                let end = offset.checked_add(size)
                    .ok_or_else(|| Error::invalid("byte range overflows"))?;

                if end > self.source.total_size() {
                    return Err(Error::invalid("payload smaller than the declared layout"));
                }

                self.source.read(offset, size)
            },

            Some(table) => {
                if self.whole_plaintext.is_none() {
                    self.whole_plaintext = Some(decompress_all_units(self.source, table)?.concat());
                }

                let plaintext = self.whole_plaintext.as_ref()
                    .ok_or_else(|| Error::bug("plaintext cache missing"))?;

                plaintext.get(u64_to_usize(offset)? .. u64_to_usize(offset + size)?)
                    .map(<[u8]>::to_vec)
                    .ok_or_else(|| Error::invalid("payload smaller than the declared layout"))
            },
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::Compression;

    #[test]
    fn whole_image_unit_is_decompressed_once_and_sliced(){
        let plaintext: Vec<u8> = (0 .. 100).map(|index| index as u8).collect();
        let compressed = Compression::Zlib.compress(&plaintext).unwrap();
        let table = CompressedUnitTable::single_unit(Compression::Zlib, compressed.len() as u64);

        let mut reader = PayloadReader::new(compressed.as_slice(), Some(&table));

        // two sub-ranges of the plaintext, not aligned to anything
        let first = reader.range_bytes(0, 40).unwrap();
        let second = reader.range_bytes(40, 60).unwrap();

        assert_eq!([first, second].concat(), plaintext);
    }

    #[test]
    fn range_outside_the_plaintext_is_invalid(){
        let plaintext = [7_u8; 16];
        let compressed = Compression::Deflate.compress(&plaintext).unwrap();
        let table = CompressedUnitTable::single_unit(Compression::Deflate, compressed.len() as u64);

        let mut reader = PayloadReader::new(compressed.as_slice(), Some(&table));
        assert!(matches!(reader.range_bytes(10, 7), Err(Error::Invalid(_))));
    }
}
