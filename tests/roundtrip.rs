//! Round-trip tests: for every layout family, encoding random planes and
//! decoding the result must reproduce the planes exactly.

use rand::Rng;
use smallvec::{smallvec, SmallVec};

use unci::prelude::*;
use unci::tiles::total_payload_size;


fn unsigned_components(depths: &[u16], align_size: u8) -> SmallVec<[Component; 4]> {
    depths.iter().enumerate()
        .map(|(index, &bit_depth)| Component::unsigned_aligned(index as u16, bit_depth, align_size))
        .collect()
}

fn rgb_roles() -> SmallVec<[ComponentRole; 4]> {
    smallvec![ComponentRole::Red, ComponentRole::Green, ComponentRole::Blue]
}

fn ycbcr_roles() -> SmallVec<[ComponentRole; 4]> {
    smallvec![ComponentRole::Luma, ComponentRole::ChromaBlue, ComponentRole::ChromaRed]
}

/// Fill every plane with random samples within its declared bit depth.
fn random_planes(layout: &LayoutDescription) -> PlaneSet {
    let mut rng = rand::rng();
    let mut planes = PlaneSet::allocate(layout).unwrap();

    let channels: Vec<Channel> = planes.planes().iter().map(|plane| plane.channel()).collect();

    for channel in channels {
        let plane = planes.plane_mut(channel).unwrap();
        let (width, height) = (plane.width(), plane.height());
        let bit_depth = plane.bit_depth();
        let wide = plane.bytes_per_sample() > 8;

        let mut view = plane.view_mut();

        for y in 0 .. height {
            for x in 0 .. width {
                if wide {
                    let bytes: [u8; 16] = rng.random();
                    view.put_sample_bytes(x, y, &bytes).unwrap();
                }
                else {
                    let value: u64 =
                        if bit_depth >= 64 { rng.random() }
                        else { rng.random_range(0 .. 1_u64 << bit_depth) };

                    view.put_sample(x, y, value).unwrap();
                }
            }
        }
    }

    planes
}

/// Encode, decode, and require exact plane equality.
fn roundtrip(layout: &LayoutDescription) {
    let planes = random_planes(layout);

    let mut payload = Vec::new();
    let table = encode_image(layout, &planes, &mut payload, None).unwrap();
    assert!(table.is_none(), "uncompressed encoding must not produce a unit table");

    assert_eq!(
        payload.len() as u64,
        total_payload_size(layout).unwrap(),
        "payload size must match the size formula"
    );

    let decoded = decode_region(layout, payload.as_slice(), None, DecodeRegion::FullImage).unwrap();
    assert_eq!(decoded, planes, "decode(encode(planes)) differs from planes");
}


#[test]
fn pixel_interleave_profiles() {
    for profile in [Profile::Rgb3, Profile::Rgba, Profile::Abgr] {
        roundtrip(&LayoutDescription::from_profile(profile, 6, 4).unwrap());
    }
}

#[test]
fn pixel_interleave_bit_packed() {
    roundtrip(&LayoutDescription::new(6, 4, LayoutParameters {
        components: unsigned_components(&[10, 10, 10], 0),
        roles: rgb_roles(),
        interleave: Interleave::Pixel,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn pixel_interleave_aligned_with_pixel_size_and_row_alignment() {
    // effective pixel of nine bytes is too wide for a packed block,
    // so this exercises the general pixel walk
    roundtrip(&LayoutDescription::new(8, 4, LayoutParameters {
        components: unsigned_components(&[16, 16, 16], 2),
        roles: rgb_roles(),
        interleave: Interleave::Pixel,
        pixel_size: 9,
        row_align_size: 4,
        tile_columns: 2,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn component_interleave_bit_packed() {
    for align_size in [0, 2] {
        roundtrip(&LayoutDescription::new(8, 8, LayoutParameters {
            components: unsigned_components(&[10, 10, 10], align_size),
            roles: rgb_roles(),
            interleave: Interleave::Component,
            row_align_size: 4,
            tile_align_size: 8,
            tile_columns: 2,
            tile_rows: 2,
            .. LayoutParameters::default()
        }).unwrap());
    }
}

#[test]
fn component_interleave_odd_depths() {
    roundtrip(&LayoutDescription::new(12, 6, LayoutParameters {
        components: unsigned_components(&[1, 7, 13], 0),
        roles: rgb_roles(),
        interleave: Interleave::Component,
        tile_columns: 3,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn component_interleave_subsampled() {
    for (sampling, tile_align_size) in [(Sampling::Yuv422, 2), (Sampling::Yuv420, 4)] {
        roundtrip(&LayoutDescription::new(16, 8, LayoutParameters {
            components: unsigned_components(&[10, 10, 10], 2),
            roles: ycbcr_roles(),
            interleave: Interleave::Component,
            sampling,
            row_align_size: 2,
            tile_align_size,
            tile_columns: 2,
            tile_rows: 2,
            .. LayoutParameters::default()
        }).unwrap());
    }
}

#[test]
fn row_interleave() {
    roundtrip(&LayoutDescription::new(6, 6, LayoutParameters {
        components: unsigned_components(&[10, 12, 14], 0),
        roles: rgb_roles(),
        interleave: Interleave::Row,
        row_align_size: 4,
        tile_columns: 2,
        tile_rows: 3,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn row_interleave_aligned_components() {
    roundtrip(&LayoutDescription::new(4, 4, LayoutParameters {
        components: unsigned_components(&[10, 10, 10], 2),
        roles: rgb_roles(),
        interleave: Interleave::Row,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn mixed_interleave() {
    for (sampling, tile_align_size, depths) in [
        (Sampling::Yuv420, 4, [8_u16, 8, 8]),
        (Sampling::Yuv422, 2, [10, 10, 10]),
    ] {
        roundtrip(&LayoutDescription::new(8, 8, LayoutParameters {
            components: unsigned_components(&depths, 0),
            roles: ycbcr_roles(),
            interleave: Interleave::Mixed,
            sampling,
            tile_align_size,
            tile_columns: 2,
            tile_rows: 2,
            .. LayoutParameters::default()
        }).unwrap());
    }
}

#[test]
fn tile_component_interleave() {
    roundtrip(&LayoutDescription::new(8, 8, LayoutParameters {
        components: unsigned_components(&[10, 10, 10], 0),
        roles: ycbcr_roles(),
        interleave: Interleave::TileComponent,
        row_align_size: 2,
        tile_align_size: 4,
        tile_columns: 2,
        tile_rows: 2,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn block_component_interleave() {
    for (block_pad_lsb, block_little_endian) in [(false, false), (true, false), (false, true), (true, true)] {
        roundtrip(&LayoutDescription::new(8, 4, LayoutParameters {
            components: unsigned_components(&[12, 12, 12], 0),
            roles: rgb_roles(),
            interleave: Interleave::Component,
            block_size: 2,
            block_pad_lsb, block_little_endian,
            row_align_size: 4,
            tile_columns: 2,
            .. LayoutParameters::default()
        }).unwrap());
    }
}

#[test]
fn block_pixel_interleave_565() {
    for (block_pad_lsb, block_little_endian, block_reversed) in [
        (false, false, false),
        (true, false, false),
        (false, true, false),
        (false, false, true),
        (true, true, true),
    ] {
        roundtrip(&LayoutDescription::new(6, 4, LayoutParameters {
            components: unsigned_components(&[5, 6, 5], 0),
            roles: rgb_roles(),
            interleave: Interleave::Pixel,
            block_size: 2,
            pixel_size: 2,
            block_pad_lsb, block_little_endian, block_reversed,
            .. LayoutParameters::default()
        }).unwrap());
    }
}

#[test]
fn block_pixel_interleave_1010102() {
    roundtrip(&LayoutDescription::new(4, 4, LayoutParameters {
        components: smallvec![
            Component::unsigned(0, 10), Component::unsigned(1, 10),
            Component::unsigned(2, 10), Component::unsigned(3, 2),
        ],
        roles: smallvec![
            ComponentRole::Red, ComponentRole::Green,
            ComponentRole::Blue, ComponentRole::Alpha,
        ],
        interleave: Interleave::Pixel,
        block_size: 4,
        pixel_size: 4,
        block_little_endian: true,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn byte_aligned_component_interleave_words() {
    for components_little_endian in [false, true] {
        for depth in [8_u16, 16, 32, 64] {
            roundtrip(&LayoutDescription::new(4, 4, LayoutParameters {
                components: unsigned_components(&[depth, depth, depth], 0),
                roles: rgb_roles(),
                interleave: Interleave::Component,
                components_little_endian,
                row_align_size: 16,
                tile_columns: 2,
                .. LayoutParameters::default()
            }).unwrap());
        }
    }
}

#[test]
fn byte_aligned_complex_pairs() {
    let components: SmallVec<[Component; 4]> = smallvec![Component {
        index: 0, bit_depth: 128,
        format: ComponentFormat::Complex,
        align_size: 0,
    }];

    roundtrip(&LayoutDescription::new(4, 2, LayoutParameters {
        components,
        roles: smallvec![ComponentRole::Monochrome],
        interleave: Interleave::Component,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn byte_aligned_float_samples() {
    let components: SmallVec<[Component; 4]> = (0..3)
        .map(|index| Component {
            index, bit_depth: 32,
            format: ComponentFormat::Float,
            align_size: 0,
        })
        .collect();

    roundtrip(&LayoutDescription::new(4, 4, LayoutParameters {
        components,
        roles: rgb_roles(),
        interleave: Interleave::Component,
        components_little_endian: true,
        .. LayoutParameters::default()
    }).unwrap());
}

#[test]
fn planar_descriptions_roundtrip() {
    // deep samples are padded to whole bytes
    roundtrip(&LayoutDescription::planar(
        &[(Channel::Luma, 12), (Channel::ChromaBlue, 12), (Channel::ChromaRed, 12)],
        Sampling::Yuv420, 8, 8,
    ).unwrap());

    // whole-word samples select the word-based family
    roundtrip(&LayoutDescription::planar(
        &[(Channel::Red, 16), (Channel::Green, 16), (Channel::Blue, 16)],
        Sampling::None, 4, 4,
    ).unwrap());
}

#[test]
fn padding_components_are_skipped_and_zero_filled() {
    // four declared streams, one of them padding
    let layout = LayoutDescription::new(4, 4, LayoutParameters {
        components: unsigned_components(&[8, 8, 8, 8], 0),
        roles: smallvec![
            ComponentRole::Red, ComponentRole::Padding,
            ComponentRole::Green, ComponentRole::Blue,
        ],
        interleave: Interleave::Pixel,
        pixel_size: 9, // too wide for a packed block
        .. LayoutParameters::default()
    }).unwrap();

    let planes = random_planes(&layout);

    let mut payload = Vec::new();
    encode_image(&layout, &planes, &mut payload, None).unwrap();

    let decoded = decode_region(&layout, payload.as_slice(), None, DecodeRegion::FullImage).unwrap();
    assert_eq!(decoded, planes);

    // the padding component's bytes must be zero in the payload:
    // each pixel is [r, pad, g, b] plus pixel padding
    assert_eq!(payload[1], 0);
    assert_eq!(payload[9 + 1], 0);
}
