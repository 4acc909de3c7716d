
//! Destination pixel planes for decoding,
//! and source pixel planes for encoding.
//!
//! Samples are stored in native byte order, each occupying the smallest
//! whole number of bytes that holds its declared bit depth (one, two, four,
//! eight, or sixteen bytes for complex pairs). The layout codecs write
//! through borrowed [`PlaneViewMut`]s and never allocate plane memory
//! themselves; a [`PlaneSet`] is the owning convenience used by the
//! image-level entry points.

use smallvec::SmallVec;

use crate::error::{Error, Result, UnitResult};
use crate::meta::LayoutDescription;
use crate::meta::component::{Channel, ComponentFormat};


/// One owned destination plane for a single channel.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Plane {
    channel: Channel,
    width: u32,
    height: u32,
    bit_depth: u16,
    format: ComponentFormat,
    bytes_per_sample: u32,
    data: Vec<u8>,
}

impl Plane {

    /// Allocate a zeroed plane.
    pub fn new(channel: Channel, width: u32, height: u32, bit_depth: u16, format: ComponentFormat) -> Self {
        let bytes_per_sample = (u32::from(bit_depth) + 7) / 8;
        let byte_count = width as usize * height as usize * bytes_per_sample as usize;

        Plane {
            channel, width, height, bit_depth, format, bytes_per_sample,
            data: vec![0_u8; byte_count],
        }
    }

    pub fn channel(&self) -> Channel { self.channel }
    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }
    pub fn bit_depth(&self) -> u16 { self.bit_depth }
    pub fn format(&self) -> ComponentFormat { self.format }

    /// Number of bytes one sample occupies.
    pub fn bytes_per_sample(&self) -> u32 { self.bytes_per_sample }

    /// Number of bytes from one row to the next.
    pub fn stride_bytes(&self) -> usize { self.width as usize * self.bytes_per_sample as usize }

    /// The raw plane bytes, rows from top to bottom, without row padding.
    pub fn bytes(&self) -> &[u8] { &self.data }

    pub fn view(&self) -> PlaneView<'_> {
        PlaneView {
            data: &self.data,
            width: self.width, height: self.height,
            stride_bytes: self.stride_bytes(),
            bytes_per_sample: self.bytes_per_sample,
            bit_depth: self.bit_depth,
        }
    }

    pub fn view_mut(&mut self) -> PlaneViewMut<'_> {
        let stride_bytes = self.stride_bytes();
        PlaneViewMut {
            width: self.width, height: self.height,
            stride_bytes,
            bytes_per_sample: self.bytes_per_sample,
            bit_depth: self.bit_depth,
            data: &mut self.data,
        }
    }

    /// Read one sample as an unsigned word. Fails outside the plane bounds.
    pub fn sample(&self, x: u32, y: u32) -> Result<u64> {
        self.view().get_sample(x, y)
    }

    /// Overwrite one sample. Fails outside the plane bounds.
    pub fn set_sample(&mut self, x: u32, y: u32, value: u64) -> UnitResult {
        self.view_mut().put_sample(x, y, value)
    }
}


/// A read-only borrowed view of one channel plane.
/// The container layer may construct views over its own pixel buffers.
#[derive(Clone, Copy, Debug)]
pub struct PlaneView<'d> {
    pub data: &'d [u8],
    pub width: u32,
    pub height: u32,
    pub stride_bytes: usize,
    pub bytes_per_sample: u32,
    pub bit_depth: u16,
}

impl<'d> PlaneView<'d> {

    fn sample_range(&self, x: u32, y: u32) -> Result<std::ops::Range<usize>> {
        if x >= self.width || y >= self.height {
            return Err(Error::bug("plane access out of bounds"));
        }

        let start = y as usize * self.stride_bytes + x as usize * self.bytes_per_sample as usize;
        let end = start + self.bytes_per_sample as usize;
        if end > self.data.len() {
            return Err(Error::bug("plane smaller than its declared bounds"));
        }

        Ok(start .. end)
    }

    /// The native-endian bytes of one sample.
    pub fn get_sample_bytes(&self, x: u32, y: u32) -> Result<&'d [u8]> {
        let range = self.sample_range(x, y)?;
        Ok(&self.data[range])
    }

    /// Read one sample of up to eight bytes as an unsigned word.
    pub fn get_sample(&self, x: u32, y: u32) -> Result<u64> {
        let bytes = self.get_sample_bytes(x, y)?;

        Ok(match bytes.len() {
            1 => u64::from(bytes[0]),
            2 => u64::from(u16::from_ne_bytes([bytes[0], bytes[1]])),
            4 => u64::from(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            8 => u64::from_ne_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
                bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
            _ => return Err(Error::bug("sample too wide for a single word")),
        })
    }
}


/// A mutable borrowed view of one channel plane.
#[derive(Debug)]
pub struct PlaneViewMut<'d> {
    pub data: &'d mut [u8],
    pub width: u32,
    pub height: u32,
    pub stride_bytes: usize,
    pub bytes_per_sample: u32,
    pub bit_depth: u16,
}

impl<'d> PlaneViewMut<'d> {

    fn sample_range(&self, x: u32, y: u32) -> Result<std::ops::Range<usize>> {
        if x >= self.width || y >= self.height {
            return Err(Error::bug("plane access out of bounds"));
        }

        let start = y as usize * self.stride_bytes + x as usize * self.bytes_per_sample as usize;
        let end = start + self.bytes_per_sample as usize;
        if end > self.data.len() {
            return Err(Error::bug("plane smaller than its declared bounds"));
        }

        Ok(start .. end)
    }

    /// Overwrite the native-endian bytes of one sample.
    pub fn put_sample_bytes(&mut self, x: u32, y: u32, bytes: &[u8]) -> UnitResult {
        let range = self.sample_range(x, y)?;
        if bytes.len() != range.len() {
            return Err(Error::bug("sample width mismatch"));
        }

        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Store one sample of up to eight bytes in native byte order.
    pub fn put_sample(&mut self, x: u32, y: u32, value: u64) -> UnitResult {
        let range = self.sample_range(x, y)?;
        let slot = &mut self.data[range];

        match slot.len() {
            1 => slot[0] = value as u8,
            2 => slot.copy_from_slice(&(value as u16).to_ne_bytes()),
            4 => slot.copy_from_slice(&(value as u32).to_ne_bytes()),
            8 => slot.copy_from_slice(&value.to_ne_bytes()),
            _ => return Err(Error::bug("sample too wide for a single word")),
        }

        Ok(())
    }

    /// Read back one sample of up to eight bytes.
    pub fn get_sample(&self, x: u32, y: u32) -> Result<u64> {
        let range = self.sample_range(x, y)?;
        let bytes = &self.data[range];

        Ok(match bytes.len() {
            1 => u64::from(bytes[0]),
            2 => u64::from(u16::from_ne_bytes([bytes[0], bytes[1]])),
            4 => u64::from(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
            8 => u64::from_ne_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3],
                bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
            _ => return Err(Error::bug("sample too wide for a single word")),
        })
    }
}


/// The set of channel planes of one decoded image or tile.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlaneSet {
    width: u32,
    height: u32,
    planes: SmallVec<[Plane; 4]>,
}

impl PlaneSet {

    /// Allocate zeroed planes for every mapped channel of the description,
    /// sized for the full image. Chroma planes are subsampled.
    pub fn allocate(layout: &LayoutDescription) -> Result<Self> {
        Self::allocate_sized(layout, layout.image_width(), layout.image_height())
    }

    /// Allocate zeroed planes sized for a single tile of the description.
    pub fn allocate_tile(layout: &LayoutDescription) -> Result<Self> {
        Self::allocate_sized(layout, layout.tile_width(), layout.tile_height())
    }

    fn allocate_sized(layout: &LayoutDescription, width: u32, height: u32) -> Result<Self> {
        let (divide_x, divide_y) = layout.sampling().chroma_divisor();

        let planes = layout.used_channels().iter()
            .map(|&channel| {
                let component = layout.component_for_channel(channel)
                    .ok_or_else(|| Error::bug("channel without a component"))?;

                let (width, height) =
                    if channel.is_chroma() { (width / divide_x, height / divide_y) }
                    else { (width, height) };

                Ok(Plane::new(channel, width, height, component.bit_depth, component.format))
            })
            .collect::<Result<_>>()?;

        Ok(PlaneSet { width, height, planes })
    }

    /// Width of the luma-resolution pixel grid these planes cover.
    pub fn width(&self) -> u32 { self.width }

    /// Height of the luma-resolution pixel grid these planes cover.
    pub fn height(&self) -> u32 { self.height }

    pub fn planes(&self) -> &[Plane] { &self.planes }

    /// Index of the specified channel within [`Self::planes`].
    pub fn index_of(&self, channel: Channel) -> Option<usize> {
        self.planes.iter().position(|plane| plane.channel() == channel)
    }

    pub fn plane(&self, channel: Channel) -> Option<&Plane> {
        self.index_of(channel).map(|index| &self.planes[index])
    }

    pub fn plane_mut(&mut self, channel: Channel) -> Option<&mut Plane> {
        let index = self.index_of(channel)?;
        Some(&mut self.planes[index])
    }

    /// Read-only views of all planes, in plane order.
    pub fn views(&self) -> SmallVec<[PlaneView<'_>; 4]> {
        self.planes.iter().map(Plane::view).collect()
    }

    /// Mutable views of all planes, in plane order.
    pub fn views_mut(&mut self) -> SmallVec<[PlaneViewMut<'_>; 4]> {
        self.planes.iter_mut().map(Plane::view_mut).collect()
    }

    /// Read one sample from the specified channel plane.
    pub fn sample(&self, channel: Channel, x: u32, y: u32) -> Result<u64> {
        self.plane(channel)
            .ok_or_else(|| Error::invalid("no plane for this channel"))?
            .sample(x, y)
    }

    /// Overwrite one sample of the specified channel plane.
    pub fn set_sample(&mut self, channel: Channel, x: u32, y: u32, value: u64) -> UnitResult {
        self.plane_mut(channel)
            .ok_or_else(|| Error::invalid("no plane for this channel"))?
            .set_sample(x, y, value)
    }
}
