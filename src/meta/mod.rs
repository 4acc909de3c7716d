
//! The declarative description of a raw pixel byte layout:
//! which sample streams exist, how they are interleaved and subsampled,
//! how rows and tiles are aligned, and how the image is tiled.
//!
//! A [`LayoutDescription`] is validated exhaustively when it is constructed
//! and is immutable afterwards. Construction is the single place where a
//! malformed description (`Error::Invalid`) is distinguished from a valid
//! but unimplemented one (`Error::NotSupported`).

pub mod component;

use smallvec::SmallVec;

use crate::error::{Error, Result, UnitResult};
use crate::layout::{self, LayoutFamily};
use self::component::{
    Channel, Component, ComponentFormat, ComponentRole, Interleave, Profile, Sampling,
};


/// The raw layout parameters as the container layer supplies them,
/// before validation. Use [`LayoutDescription::new`] to validate them.
#[derive(Clone, Debug)]
pub struct LayoutParameters {

    /// The encoded sample streams, in serialization order.
    pub components: SmallVec<[Component; 4]>,

    /// The channel-mapping table, parallel to `components`.
    pub roles: SmallVec<[ComponentRole; 4]>,

    pub interleave: Interleave,
    pub sampling: Sampling,

    /// Byte size of one packed block, for the block layout variants.
    pub block_size: u8,

    /// Whether multi-byte samples are stored least significant byte first.
    pub components_little_endian: bool,

    /// Whether unused block bits pad the least significant end.
    pub block_pad_lsb: bool,

    /// Whether packed blocks are stored least significant byte first.
    pub block_little_endian: bool,

    /// Whether components appear in reverse order within a packed block.
    pub block_reversed: bool,

    /// If nonzero, every pixel is padded to this many bytes.
    pub pixel_size: u32,

    /// If nonzero, every row is padded to a multiple of this many bytes.
    pub row_align_size: u32,

    /// If nonzero, every tile is padded to a multiple of this many bytes.
    pub tile_align_size: u32,

    pub tile_columns: u32,
    pub tile_rows: u32,
}

impl Default for LayoutParameters {
    fn default() -> Self {
        LayoutParameters {
            components: SmallVec::new(),
            roles: SmallVec::new(),
            interleave: Interleave::Pixel,
            sampling: Sampling::None,
            block_size: 0,
            components_little_endian: false,
            block_pad_lsb: false,
            block_little_endian: false,
            block_reversed: false,
            pixel_size: 0,
            row_align_size: 0,
            tile_align_size: 0,
            tile_columns: 1,
            tile_rows: 1,
        }
    }
}


/// A validated, immutable layout description.
///
/// Besides the declared parameters, this knows the image dimensions and
/// the layout family that will decode or encode the payload. Constructing
/// a description fails fast: either every invariant holds, or no
/// description exists at all.
#[derive(Clone, Debug)]
pub struct LayoutDescription {
    image_width: u32,
    image_height: u32,
    params: LayoutParameters,
    family: LayoutFamily,
}

impl LayoutDescription {

    /// Validate the parameters for an image of the specified dimensions.
    /// Returns `Error::Invalid` for contradictions in the declaration, and
    /// `Error::NotSupported` for declarations no layout family implements.
    pub fn new(image_width: u32, image_height: u32, params: LayoutParameters) -> Result<Self> {
        validate(image_width, image_height, &params)?;

        let family = layout::select(&params).ok_or_else(|| Error::unsupported(
            "no layout family implements this combination of interleave, sampling, block and sample parameters"
        ))?;

        Ok(LayoutDescription { image_width, image_height, params, family })
    }

    /// The description implied by a minimized profile:
    /// interleaved 8 bit samples, a single tile, no compression hints.
    pub fn from_profile(profile: Profile, image_width: u32, image_height: u32) -> Result<Self> {
        Self::new(image_width, image_height, LayoutParameters {
            components: profile.components(),
            roles: profile.roles(),
            interleave: Interleave::Pixel,
            .. LayoutParameters::default()
        })
    }

    /// The description an encoder would emit for a planar image
    /// with the specified channels and bit depths: component interleave,
    /// samples padded to whole bytes where their depth requires it.
    pub fn planar(
        channels: &[(Channel, u16)],
        sampling: Sampling,
        image_width: u32, image_height: u32,
    ) -> Result<Self>
    {
        let has_chroma = channels.iter().any(|(channel, _)| channel.is_chroma());

        let components = channels.iter().enumerate()
            .map(|(index, &(_, bit_depth))| {
                let align_size = if bit_depth % 8 == 0 { 0 } else { ((bit_depth + 7) / 8) as u8 };
                Component::unsigned_aligned(index as u16, bit_depth, align_size)
            })
            .collect();

        let roles = channels.iter()
            .map(|&(channel, _)| match channel {
                Channel::Luma if !has_chroma => ComponentRole::Monochrome,
                Channel::Luma => ComponentRole::Luma,
                Channel::ChromaBlue => ComponentRole::ChromaBlue,
                Channel::ChromaRed => ComponentRole::ChromaRed,
                Channel::Red => ComponentRole::Red,
                Channel::Green => ComponentRole::Green,
                Channel::Blue => ComponentRole::Blue,
                Channel::Alpha => ComponentRole::Alpha,
            })
            .collect();

        // whole-byte samples wider than one byte select the word-based
        // layout family, which stores explicitly little endian here
        let all_whole_bytes = channels.iter().all(|&(_, depth)| depth % 8 == 0);
        let any_wide = channels.iter().any(|&(_, depth)| depth > 8);

        Self::new(image_width, image_height, LayoutParameters {
            components, roles,
            interleave: Interleave::Component,
            sampling,
            components_little_endian: all_whole_bytes && any_wide,
            .. LayoutParameters::default()
        })
    }

    pub fn image_width(&self) -> u32 { self.image_width }
    pub fn image_height(&self) -> u32 { self.image_height }

    pub fn components(&self) -> &[Component] { &self.params.components }
    pub fn roles(&self) -> &[ComponentRole] { &self.params.roles }

    /// The destination channel of the specified component, if it has one.
    pub fn channel_of(&self, component_index: usize) -> Option<Channel> {
        self.params.roles[component_index].channel()
    }

    pub fn interleave(&self) -> Interleave { self.params.interleave }
    pub fn sampling(&self) -> Sampling { self.params.sampling }

    pub fn block_size(&self) -> u8 { self.params.block_size }
    pub fn components_little_endian(&self) -> bool { self.params.components_little_endian }
    pub fn block_pad_lsb(&self) -> bool { self.params.block_pad_lsb }
    pub fn block_little_endian(&self) -> bool { self.params.block_little_endian }
    pub fn block_reversed(&self) -> bool { self.params.block_reversed }

    pub fn pixel_size(&self) -> u32 { self.params.pixel_size }
    pub fn row_align_size(&self) -> u32 { self.params.row_align_size }
    pub fn tile_align_size(&self) -> u32 { self.params.tile_align_size }

    pub fn tile_columns(&self) -> u32 { self.params.tile_columns }
    pub fn tile_rows(&self) -> u32 { self.params.tile_rows }
    pub fn tile_count(&self) -> u32 { self.params.tile_columns * self.params.tile_rows }

    /// Width of one tile in luma samples. Guaranteed nonzero.
    pub fn tile_width(&self) -> u32 { self.image_width / self.params.tile_columns }

    /// Height of one tile in luma samples. Guaranteed nonzero.
    pub fn tile_height(&self) -> u32 { self.image_height / self.params.tile_rows }

    /// The row-major index of the specified tile.
    pub fn tile_index(&self, tile_column: u32, tile_row: u32) -> u32 {
        tile_column + tile_row * self.params.tile_columns
    }

    /// The layout family that decodes and encodes this description.
    pub fn family(&self) -> LayoutFamily { self.family }

    /// All mapped destination channels, in component order, without duplicates.
    pub fn used_channels(&self) -> SmallVec<[Channel; 4]> {
        let mut channels = SmallVec::new();
        for role in self.roles() {
            if let Some(channel) = role.channel() {
                if !channels.contains(&channel) { channels.push(channel); }
            }
        }
        channels
    }

    /// The component that is decoded into the specified channel, if any.
    pub(crate) fn component_for_channel(&self, channel: Channel) -> Option<&Component> {
        self.roles().iter().position(|role| role.channel() == Some(channel))
            .map(|index| &self.components()[index])
    }
}


fn validate(image_width: u32, image_height: u32, params: &LayoutParameters) -> UnitResult {
    if image_width == 0 || image_height == 0 {
        return Err(Error::invalid("image dimensions must not be zero"));
    }

    if params.components.is_empty() {
        return Err(Error::invalid("a layout requires at least one component"));
    }

    if params.components.len() != params.roles.len() {
        return Err(Error::invalid("component list and channel-mapping table differ in length"));
    }

    for component in &params.components {
        if component.bit_depth == 0 || component.bit_depth > 128 {
            return Err(Error::invalid("component bit depth outside of 1..=128"));
        }

        if component.bit_depth == 128 && component.format != ComponentFormat::Complex {
            return Err(Error::invalid("128 bit samples must be complex pairs"));
        }
    }

    // each destination plane may be fed by at most one component
    let mut seen: SmallVec<[Channel; 4]> = SmallVec::new();
    for role in &params.roles {
        if let Some(channel) = role.channel() {
            if seen.contains(&channel) {
                return Err(Error::invalid("multiple components are mapped to the same channel"));
            }
            seen.push(channel);
        }
    }

    if params.tile_columns == 0 || params.tile_rows == 0 {
        return Err(Error::invalid("tile grid must not be empty"));
    }

    if image_width % params.tile_columns != 0 || image_height % params.tile_rows != 0 {
        return Err(Error::invalid("image dimensions must be divisible by the tile grid"));
    }

    let tile_width = image_width / params.tile_columns;
    let tile_height = image_height / params.tile_rows;

    if params.pixel_size != 0 {
        if params.interleave != Interleave::Pixel {
            return Err(Error::invalid("a pixel size is only valid with pixel interleave"));
        }

        // unless the pixel forms one packed block,
        // a padded pixel must begin on a byte boundary
        let packed_block = layout::select(params) == Some(LayoutFamily::BlockPixel);

        let byte_aligned_samples = params.components.iter()
            .all(|component| component.align_size != 0 || component.bit_depth % 8 == 0);

        if !packed_block && !byte_aligned_samples {
            return Err(Error::invalid("a pixel size requires byte-aligned component samples"));
        }
    }

    if params.interleave == Interleave::Mixed && params.sampling == Sampling::None {
        return Err(Error::invalid("mixed interleave requires chroma subsampling"));
    }

    if params.sampling != Sampling::None {
        let legal_interleave = matches!(
            params.interleave,
            Interleave::Component | Interleave::Mixed
        );

        if !legal_interleave {
            return Err(Error::invalid(
                "chroma subsampling is only valid with component or mixed interleave"
            ));
        }

        // subsampled layouts are only defined for a luma + chroma pair
        let mapped: SmallVec<[Channel; 4]> = params.roles.iter()
            .filter_map(|role| role.channel()).collect();

        let is_ycbcr = mapped.len() == 3
            && mapped.contains(&Channel::Luma)
            && mapped.contains(&Channel::ChromaBlue)
            && mapped.contains(&Channel::ChromaRed);

        if !is_ycbcr {
            return Err(Error::invalid("chroma subsampling requires exactly the Y, Cb and Cr channels"));
        }

        let (divide_x, divide_y) = params.sampling.chroma_divisor();
        if tile_width % divide_x != 0 || tile_height % divide_y != 0 {
            return Err(Error::invalid("tile dimensions must be divisible by the chroma subsampling"));
        }
    }

    if params.sampling == Sampling::Yuv422 {
        if params.interleave == Interleave::Component
            && params.row_align_size % 2 != 0 {
            return Err(Error::invalid("4:2:2 subsampling with component interleave requires an even row alignment"));
        }

        if params.tile_align_size % 2 != 0 {
            return Err(Error::invalid("4:2:2 subsampling requires an even tile alignment"));
        }
    }

    if params.sampling == Sampling::Yuv420 && params.tile_align_size % 4 != 0 {
        return Err(Error::invalid("4:2:0 subsampling requires the tile alignment to be a multiple of four"));
    }

    Ok(())
}
