
//! The eight bit/byte layout families and the strategy selection between
//! them. Each family implements a bit-exact decode and encode of one
//! interleave arrangement, and knows the byte size of one serialized tile.
//!
//! Dispatch is a single `match` over [`LayoutFamily`]; the per-family
//! algorithms live in the submodules.

mod component;
mod pixel;
mod mixed;
mod row;
mod block;
mod byte_aligned;

pub(crate) use self::component::decode_component_block as decode_single_component_block;

use smallvec::SmallVec;

use crate::error::{Result, UnitResult};
use crate::image::{PlaneView, PlaneViewMut};
use crate::math::{align_to, bits_to_bytes, Vec2};
use crate::meta::{LayoutDescription, LayoutParameters};
use crate::meta::component::{Channel, ComponentFormat, Interleave, Sampling};


/// One of the eight supported layout arrangements.
/// Chosen once when a layout description is constructed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum LayoutFamily {

    /// One component's full sample grid after another's.
    Component,

    /// Component interleave with independently addressable
    /// (component, tile) blocks.
    TileComponent,

    /// All components of a pixel contiguous, bit-packed.
    Pixel,

    /// Luma rows interleaved with pixel-interleaved chroma pairs.
    Mixed,

    /// Per row, one component's samples after another's.
    Row,

    /// One component per packed block, component interleaved.
    BlockComponent,

    /// All components of a pixel packed into one block word.
    BlockPixel,

    /// Component interleave restricted to whole-word samples.
    ByteComponent,
}


/// Choose the layout family for validated parameters.
/// Pure; returns `None` if no family implements the combination.
///
/// The specialized families are tested before the general ones
/// (they would be unreachable otherwise), so the first match is
/// also the only match.
pub(crate) fn select(params: &LayoutParameters) -> Option<LayoutFamily> {
    if matches_block_component(params) { return Some(LayoutFamily::BlockComponent); }
    if matches_block_pixel(params) { return Some(LayoutFamily::BlockPixel); }
    if matches_byte_component(params) { return Some(LayoutFamily::ByteComponent); }

    if matches_bit_packed_rules(params) {
        return Some(match params.interleave {
            Interleave::Component => LayoutFamily::Component,
            Interleave::TileComponent => LayoutFamily::TileComponent,
            Interleave::Pixel => LayoutFamily::Pixel,
            Interleave::Mixed => LayoutFamily::Mixed,
            Interleave::Row => LayoutFamily::Row,
        });
    }

    None
}

fn matches_block_component(params: &LayoutParameters) -> bool {
    let block_bits = u16::from(params.block_size) * 8;

    params.interleave == Interleave::Component
        && params.block_size > 0 && params.block_size <= 8
        && params.pixel_size == 0
        && params.sampling == Sampling::None
        && params.components.iter().all(|component|
            component.format == ComponentFormat::Unsigned
                && component.bit_depth <= 16
                && component.bit_depth <= block_bits
                && component.bit_depth > block_bits / 2  // exactly one component per block
        )
}

fn matches_block_pixel(params: &LayoutParameters) -> bool {
    let effective_block_size =
        if params.block_size == 0 { params.pixel_size }
        else { u32::from(params.block_size) };

    let total_bits: u32 = params.components.iter()
        .map(|component| u32::from(component.bit_depth)).sum();

    params.interleave == Interleave::Pixel
        && (params.block_size == 0 || u32::from(params.block_size) == params.pixel_size)
        && effective_block_size > 0 && effective_block_size <= 8
        && total_bits <= effective_block_size * 8  // all components share one block
        && params.sampling == Sampling::None
        && !params.components_little_endian
        && params.components.iter().all(|component|
            component.format == ComponentFormat::Unsigned && component.bit_depth <= 16
        )
}

fn matches_byte_component(params: &LayoutParameters) -> bool {
    params.interleave == Interleave::Component
        && params.block_size == 0
        && params.pixel_size == 0
        && params.sampling == Sampling::None
        && params.components.iter().all(|component|
            matches!(component.bit_depth, 8 | 16 | 32 | 64 | 128)
                && (component.bit_depth != 128 || component.format == ComponentFormat::Complex)
        )
}

/// Requirements shared by the general bit-cursor families.
fn matches_bit_packed_rules(params: &LayoutParameters) -> bool {
    let all_single_byte = params.components.iter()
        .all(|component| component.bit_depth == 8);

    params.block_size == 0
        && !params.block_pad_lsb
        && !params.block_little_endian
        && !params.block_reversed
        && (!params.components_little_endian || all_single_byte)
        && params.components.iter().all(|component|
            component.format == ComponentFormat::Unsigned
                && component.bit_depth <= 16
                && component.align_size <= 2
        )
}


/// The per-tile mapping of one component onto its destination plane,
/// with the source geometry the layout walks need. Built fresh as an
/// immutable value for each decode or encode call, never retained.
#[derive(Clone, Debug)]
pub(crate) struct ChannelEntry {

    /// The destination channel, or `None` for padding components.
    pub channel: Option<Channel>,

    /// Index of the destination plane in the view list. `None` when the
    /// component is padding or its plane is not part of the request.
    pub plane: Option<usize>,

    /// Index of the opposite chroma plane, for the jointly
    /// processed chroma pairs of the mixed arrangement.
    pub partner_plane: Option<usize>,

    /// Tile width in this component's samples (subsampled for chroma).
    pub tile_width: u32,

    /// Tile height in this component's samples (subsampled for chroma).
    pub tile_height: u32,

    pub bit_depth: u16,
    pub align_size: u8,

    /// Bytes one decoded sample occupies in the destination plane.
    pub bytes_per_sample: u32,

    /// Source bytes one sample occupies after component alignment.
    pub aligned_bytes_per_sample: u32,

    /// Pad bits preceding each sample when the component is aligned.
    pub pad_bits: u32,
}

/// Build the channel entries of a description. `plane_channels` lists the
/// channel of each destination plane view, in view order; an empty list
/// yields entries usable for size computations only.
pub(crate) fn channel_entries(
    layout: &LayoutDescription,
    plane_channels: &[Channel],
) -> SmallVec<[ChannelEntry; 4]>
{
    let (divide_x, divide_y) = layout.sampling().chroma_divisor();

    layout.components().iter().zip(layout.roles())
        .map(|(component, role)| {
            let channel = role.channel();
            let is_chroma = channel.map_or(false, Channel::is_chroma);

            let (tile_width, tile_height) =
                if is_chroma { (layout.tile_width() / divide_x, layout.tile_height() / divide_y) }
                else { (layout.tile_width(), layout.tile_height()) };

            let plane = channel.and_then(|channel|
                plane_channels.iter().position(|&existing| existing == channel));

            let partner_plane = channel
                .and_then(Channel::chroma_partner)
                .and_then(|partner| plane_channels.iter().position(|&existing| existing == partner));

            let bytes_per_sample = component.bytes_per_sample();
            let aligned_bytes_per_sample = component.aligned_bytes_per_sample();

            let pad_bits = if component.align_size == 0 { 0 }
                else { aligned_bytes_per_sample * 8 - u32::from(component.bit_depth) };

            ChannelEntry {
                channel, plane, partner_plane,
                tile_width, tile_height,
                bit_depth: component.bit_depth,
                align_size: component.align_size,
                bytes_per_sample, aligned_bytes_per_sample, pad_bits,
            }
        })
        .collect()
}

impl ChannelEntry {

    /// Source byte count of one of this component's rows, including
    /// component alignment and the trailing row alignment.
    pub(crate) fn row_bytes(&self, row_align_size: u32) -> u64 {
        let bits_per_sample =
            if self.align_size == 0 { u64::from(self.bit_depth) }
            else { u64::from(self.aligned_bytes_per_sample) * 8 };

        let bytes = bits_to_bytes(bits_per_sample * u64::from(self.tile_width));
        align_to(bytes, row_align_size)
    }
}


impl LayoutFamily {

    /// The serialized byte sizes of one tile: a single entry for the
    /// contiguous arrangements, one entry per component for the
    /// tile-component arrangement.
    pub(crate) fn tile_data_sizes(self, layout: &LayoutDescription) -> Result<SmallVec<[u64; 4]>> {
        let entries = channel_entries(layout, &[]);

        Ok(match self {
            LayoutFamily::Component => smallvec![component::tile_size(layout, &entries)],
            LayoutFamily::TileComponent => component::per_component_tile_sizes(layout, &entries),
            LayoutFamily::Pixel => smallvec![pixel::tile_size(layout, &entries)?],
            LayoutFamily::Mixed => smallvec![mixed::tile_size(layout, &entries)],
            LayoutFamily::Row => smallvec![row::tile_size(layout, &entries)],
            LayoutFamily::BlockComponent => smallvec![block::component_tile_size(layout, &entries)],
            LayoutFamily::BlockPixel => smallvec![block::pixel_tile_size(layout)],
            LayoutFamily::ByteComponent => smallvec![byte_aligned::tile_size(layout, &entries)],
        })
    }

    /// Decode one tile's bytes into the destination views, placing the
    /// samples at the tile position `place` (in tile indices).
    pub(crate) fn decode_tile(
        self,
        layout: &LayoutDescription,
        entries: &[ChannelEntry],
        views: &mut [PlaneViewMut<'_>],
        bytes: &[u8],
        place: Vec2<u32>,
    ) -> UnitResult
    {
        match self {
            LayoutFamily::Component => component::decode_tile(layout, entries, views, bytes, place, false),
            LayoutFamily::TileComponent => component::decode_tile(layout, entries, views, bytes, place, true),
            LayoutFamily::Pixel => pixel::decode_tile(layout, entries, views, bytes, place),
            LayoutFamily::Mixed => mixed::decode_tile(layout, entries, views, bytes, place),
            LayoutFamily::Row => row::decode_tile(layout, entries, views, bytes, place),
            LayoutFamily::BlockComponent => block::decode_component_tile(layout, entries, views, bytes, place),
            LayoutFamily::BlockPixel => block::decode_pixel_tile(layout, entries, views, bytes, place),
            LayoutFamily::ByteComponent => byte_aligned::decode_tile(layout, entries, views, bytes, place),
        }
    }

    /// Serialize one tile from the source views at tile position `place`.
    /// The result has exactly the byte size [`Self::tile_data_sizes`]
    /// declares (summed over components for tile-component).
    pub(crate) fn encode_tile(
        self,
        layout: &LayoutDescription,
        entries: &[ChannelEntry],
        views: &[PlaneView<'_>],
        place: Vec2<u32>,
    ) -> Result<Vec<u8>>
    {
        match self {
            LayoutFamily::Component => component::encode_tile(layout, entries, views, place, false),
            LayoutFamily::TileComponent => component::encode_tile(layout, entries, views, place, true),
            LayoutFamily::Pixel => pixel::encode_tile(layout, entries, views, place),
            LayoutFamily::Mixed => mixed::encode_tile(layout, entries, views, place),
            LayoutFamily::Row => row::encode_tile(layout, entries, views, place),
            LayoutFamily::BlockComponent => block::encode_component_tile(layout, entries, views, place),
            LayoutFamily::BlockPixel => block::encode_pixel_tile(layout, entries, views, place),
            LayoutFamily::ByteComponent => byte_aligned::encode_tile(layout, entries, views, place),
        }
    }
}


/// Decode one row of a single component, advancing the cursor over
/// component alignment and ending at the next byte boundary.
/// Padding components consume the same bits without writing.
pub(crate) fn decode_component_row(
    entry: &ChannelEntry,
    bits: &mut crate::io::BitReader<'_>,
    views: &mut [PlaneViewMut<'_>],
    dst_x0: u32,
    dst_y: u32,
) -> UnitResult
{
    for x in 0 .. entry.tile_width {
        if entry.align_size != 0 {
            bits.skip_to_byte_boundary();
            bits.skip_bits(entry.pad_bits as usize)?;
        }

        match entry.plane {
            Some(plane) => {
                let value = bits.read_bits(entry.bit_depth as usize)?;
                views[plane].put_sample(dst_x0 + x, dst_y, value)?;
            },
            None => bits.skip_bits(entry.bit_depth as usize)?,
        }
    }

    bits.skip_to_byte_boundary();
    Ok(())
}

/// The mirror of [`decode_component_row`].
/// Padding components emit zero bits.
pub(crate) fn encode_component_row(
    entry: &ChannelEntry,
    bits: &mut crate::io::BitWriter,
    views: &[PlaneView<'_>],
    src_x0: u32,
    src_y: u32,
) -> UnitResult
{
    for x in 0 .. entry.tile_width {
        if entry.align_size != 0 {
            bits.align_to_byte_boundary();
            bits.write_bits(0, entry.pad_bits as usize);
        }

        let value = match entry.plane {
            Some(plane) => views[plane].get_sample(src_x0 + x, src_y)?,
            None => 0,
        };

        bits.write_bits(value, entry.bit_depth as usize);
    }

    bits.align_to_byte_boundary();
    Ok(())
}


#[cfg(test)]
mod test {
    use super::*;
    use crate::meta::component::{Component, ComponentRole, Interleave, Profile};
    use crate::meta::LayoutDescription;

    fn unsigned_components(depths: &[u16]) -> SmallVec<[Component; 4]> {
        depths.iter().enumerate()
            .map(|(index, &depth)| Component::unsigned(index as u16, depth))
            .collect()
    }

    fn rgb_roles() -> SmallVec<[ComponentRole; 4]> {
        smallvec![ComponentRole::Red, ComponentRole::Green, ComponentRole::Blue]
    }

    #[test]
    fn selects_the_specialized_families_first(){
        // packed 5-6-5 in a two byte block
        let block565 = LayoutParameters {
            components: unsigned_components(&[5, 6, 5]),
            roles: rgb_roles(),
            interleave: Interleave::Pixel,
            block_size: 2, pixel_size: 2,
            .. LayoutParameters::default()
        };
        assert_eq!(select(&block565), Some(LayoutFamily::BlockPixel));

        let block_component = LayoutParameters {
            components: unsigned_components(&[12, 12, 12]),
            roles: rgb_roles(),
            interleave: Interleave::Component,
            block_size: 2,
            .. LayoutParameters::default()
        };
        assert_eq!(select(&block_component), Some(LayoutFamily::BlockComponent));

        let whole_words = LayoutParameters {
            components: unsigned_components(&[16, 16, 16]),
            roles: rgb_roles(),
            interleave: Interleave::Component,
            components_little_endian: true,
            .. LayoutParameters::default()
        };
        assert_eq!(select(&whole_words), Some(LayoutFamily::ByteComponent));
    }

    #[test]
    fn general_families_absorb_the_remainder(){
        let bit_packed = LayoutParameters {
            components: unsigned_components(&[10, 10, 10]),
            roles: rgb_roles(),
            interleave: Interleave::Row,
            .. LayoutParameters::default()
        };
        assert_eq!(select(&bit_packed), Some(LayoutFamily::Row));

        let ten_bit_component = LayoutParameters {
            components: unsigned_components(&[10, 10, 10]),
            roles: rgb_roles(),
            interleave: Interleave::Component,
            .. LayoutParameters::default()
        };
        assert_eq!(select(&ten_bit_component), Some(LayoutFamily::Component));
    }

    #[test]
    fn unimplemented_combinations_select_nothing(){
        // little endian samples that are not whole bytes
        let packed_little_endian = LayoutParameters {
            components: unsigned_components(&[10, 10, 10]),
            roles: rgb_roles(),
            interleave: Interleave::Pixel,
            components_little_endian: true,
            .. LayoutParameters::default()
        };
        assert_eq!(select(&packed_little_endian), None);

        // bit-packed depth above 16
        let deep = LayoutParameters {
            components: unsigned_components(&[24, 24, 24]),
            roles: rgb_roles(),
            interleave: Interleave::Pixel,
            .. LayoutParameters::default()
        };
        assert_eq!(select(&deep), None);
    }

    #[test]
    fn every_validated_description_has_exactly_one_family(){
        // the constructor runs validation and then selection,
        // so every description that exists carries a family
        for profile in [Profile::Rgb3, Profile::Rgba, Profile::Abgr] {
            let layout = LayoutDescription::from_profile(profile, 4, 4).unwrap();
            assert_eq!(layout.family(), LayoutFamily::Pixel);
        }

        for depth in 1..=16 {
            let layout = LayoutDescription::new(4, 4, LayoutParameters {
                components: unsigned_components(&[depth, depth, depth]),
                roles: rgb_roles(),
                interleave: Interleave::Component,
                .. LayoutParameters::default()
            }).unwrap();

            // whole-word depths specialize, everything else stays general
            if depth == 8 || depth == 16 {
                assert_eq!(layout.family(), LayoutFamily::ByteComponent);
            } else {
                assert_eq!(layout.family(), LayoutFamily::Component);
            }
        }
    }

    #[test]
    fn row_size_includes_component_and_row_alignment(){
        // three components of ten bits, each aligned to two bytes,
        // a one-pixel-wide tile, rows aligned to four bytes:
        // every row occupies two bytes per component, rounded up to eight
        let layout = LayoutDescription::new(1, 4, LayoutParameters {
            components: (0..3)
                .map(|index| Component::unsigned_aligned(index, 10, 2))
                .collect(),
            roles: rgb_roles(),
            interleave: Interleave::Row,
            row_align_size: 4,
            .. LayoutParameters::default()
        }).unwrap();

        let sizes = layout.family().tile_data_sizes(&layout).unwrap();
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[0], 8 * 4);
    }
}
