
//! Describes the encoded sample streams of an image payload
//! and the semantic channels they are mapped to.

use smallvec::SmallVec;


/// One encoded sample stream. The order of components within a layout
/// description is significant, as it is the order in which the streams
/// appear in the serialized bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Component {

    /// Position of this component in the channel-mapping table.
    pub index: u16,

    /// Number of bits per sample, in the range `1..=128`.
    pub bit_depth: u16,

    /// How the sample bits are to be interpreted.
    pub format: ComponentFormat,

    /// If nonzero, each encoded sample is padded to this many bytes.
    pub align_size: u8,
}

impl Component {

    /// An unsigned component without sample alignment.
    pub fn unsigned(index: u16, bit_depth: u16) -> Self {
        Component { index, bit_depth, format: ComponentFormat::Unsigned, align_size: 0 }
    }

    /// An unsigned component whose samples are padded to `align_size` bytes.
    pub fn unsigned_aligned(index: u16, bit_depth: u16, align_size: u8) -> Self {
        Component { index, bit_depth, format: ComponentFormat::Unsigned, align_size }
    }

    /// Number of bytes one decoded sample occupies in its destination plane.
    pub fn bytes_per_sample(&self) -> u32 {
        (u32::from(self.bit_depth) + 7) / 8
    }

    /// Number of source bytes one sample occupies
    /// after applying the component alignment.
    pub(crate) fn aligned_bytes_per_sample(&self) -> u32 {
        crate::math::align_to(u64::from(self.bytes_per_sample()), u32::from(self.align_size)) as u32
    }
}


/// The numeric interpretation of the samples of one component.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ComponentFormat {

    /// Unsigned integer samples.
    Unsigned,

    /// Two's complement signed integer samples.
    Signed,

    /// IEEE 754 floating point samples.
    Float,

    /// A pair of two equally sized values forming a complex number.
    Complex,
}


/// A semantic destination plane.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Channel {
    /// The luma plane. Also the destination of monochrome components.
    Luma,
    /// The blue-difference chroma plane.
    ChromaBlue,
    /// The red-difference chroma plane.
    ChromaRed,
    Red,
    Green,
    Blue,
    Alpha,
}

impl Channel {

    /// Whether this channel is subsampled under 4:2:2 or 4:2:0.
    pub fn is_chroma(self) -> bool {
        matches!(self, Channel::ChromaBlue | Channel::ChromaRed)
    }

    /// The other half of a chroma pair, if this is a chroma channel.
    pub(crate) fn chroma_partner(self) -> Option<Channel> {
        match self {
            Channel::ChromaBlue => Some(Channel::ChromaRed),
            Channel::ChromaRed => Some(Channel::ChromaBlue),
            _ => None,
        }
    }
}


/// One entry of the channel-mapping table: assigns a component
/// either a semantic channel or marks it as padding.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ComponentRole {
    /// A single grey component. Decoded into the luma plane.
    Monochrome,
    Luma,
    ChromaBlue,
    ChromaRed,
    Red,
    Green,
    Blue,
    Alpha,

    /// Filler bits. Skipped when decoding, zero-filled when encoding.
    Padding,
}

impl ComponentRole {

    /// The destination plane for this role, or none for padding.
    pub fn channel(self) -> Option<Channel> {
        match self {
            ComponentRole::Monochrome => Some(Channel::Luma),
            ComponentRole::Luma => Some(Channel::Luma),
            ComponentRole::ChromaBlue => Some(Channel::ChromaBlue),
            ComponentRole::ChromaRed => Some(Channel::ChromaRed),
            ComponentRole::Red => Some(Channel::Red),
            ComponentRole::Green => Some(Channel::Green),
            ComponentRole::Blue => Some(Channel::Blue),
            ComponentRole::Alpha => Some(Channel::Alpha),
            ComponentRole::Padding => None,
        }
    }
}


/// The order in which components, pixels and rows are serialized.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Interleave {

    /// All samples of component 0 first, then all of component 1, and so on.
    Component,

    /// All components of one pixel are contiguous.
    Pixel,

    /// Luma rows interleaved with pixel-interleaved chroma pairs.
    Mixed,

    /// Within each row, one component's samples after another's.
    Row,

    /// Like component interleave, but every (component, tile) block
    /// is an independently addressable unit.
    TileComponent,
}


/// The chroma subsampling ratio.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Sampling {

    /// No subsampling (4:4:4).
    None,

    /// Chroma halved horizontally (4:2:2).
    Yuv422,

    /// Chroma halved horizontally and vertically (4:2:0).
    Yuv420,
}

impl Sampling {

    /// Horizontal and vertical divisor applied to chroma plane dimensions.
    pub fn chroma_divisor(self) -> (u32, u32) {
        match self {
            Sampling::None => (1, 1),
            Sampling::Yuv422 => (2, 1),
            Sampling::Yuv420 => (2, 2),
        }
    }
}


/// A minimized layout profile with a fixed, implicit component list
/// and channel mapping. Requires no channel-mapping table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Profile {

    /// Interleaved 3x8 bit RGB.
    Rgb3,

    /// Interleaved 4x8 bit RGBA.
    Rgba,

    /// Interleaved 4x8 bit ABGR.
    Abgr,
}

impl Profile {

    /// The implicit channel mapping of this profile.
    pub fn roles(self) -> SmallVec<[ComponentRole; 4]> {
        match self {
            Profile::Rgb3 => smallvec![
                ComponentRole::Red, ComponentRole::Green, ComponentRole::Blue,
            ],
            Profile::Rgba => smallvec![
                ComponentRole::Red, ComponentRole::Green,
                ComponentRole::Blue, ComponentRole::Alpha,
            ],
            Profile::Abgr => smallvec![
                ComponentRole::Alpha, ComponentRole::Blue,
                ComponentRole::Green, ComponentRole::Red,
            ],
        }
    }

    /// The implicit component list of this profile: 8 bit unsigned samples,
    /// one per mapped channel, without extra alignment.
    pub fn components(self) -> SmallVec<[Component; 4]> {
        self.roles().iter().enumerate()
            .map(|(index, _)| Component::unsigned(index as u16, 8))
            .collect()
    }
}
