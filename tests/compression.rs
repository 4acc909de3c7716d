//! Generic compression units wrapped around the payload: whole-image
//! units that must be decompressed once and sliced, per-tile units that
//! are fetched individually, and the store method.

use rand::Rng;
use smallvec::{smallvec, SmallVec};

use unci::prelude::*;
use unci::tiles::total_payload_size;


fn unsigned_components(depths: &[u16]) -> SmallVec<[Component; 4]> {
    depths.iter().enumerate()
        .map(|(index, &bit_depth)| Component::unsigned(index as u16, bit_depth))
        .collect()
}

fn tiled_rgb_layout() -> LayoutDescription {
    LayoutDescription::new(8, 8, LayoutParameters {
        components: unsigned_components(&[10, 10, 10]),
        roles: smallvec![ComponentRole::Red, ComponentRole::Green, ComponentRole::Blue],
        interleave: Interleave::Component,
        row_align_size: 2,
        tile_columns: 2,
        tile_rows: 2,
        .. LayoutParameters::default()
    }).unwrap()
}

fn random_plaintext(layout: &LayoutDescription) -> Vec<u8> {
    let mut rng = rand::rng();
    (0 .. total_payload_size(layout).unwrap()).map(|_| rng.random()).collect()
}


#[test]
fn whole_image_unit_slices_consistently() {
    let layout = tiled_rgb_layout();
    let plaintext = random_plaintext(&layout);

    let compressed = Compression::Zlib.compress(&plaintext).unwrap();
    let table = CompressedUnitTable::single_unit(Compression::Zlib, compressed.len() as u64);

    // the plain decode is the reference
    let reference = decode_region(&layout, plaintext.as_slice(), None, DecodeRegion::FullImage).unwrap();

    // full image through the compressed unit
    let full = decode_region(&layout, compressed.as_slice(), Some(&table), DecodeRegion::FullImage).unwrap();
    assert_eq!(full, reference);

    // tile-wise access slices sub-ranges out of the same plaintext;
    // every tile must agree with the corresponding full-decode region
    for row in 0 .. 2 {
        for column in 0 .. 2 {
            let tile = decode_region(
                &layout, compressed.as_slice(), Some(&table),
                DecodeRegion::Tile { column, row },
            ).unwrap();

            for channel in [Channel::Red, Channel::Green, Channel::Blue] {
                for y in 0 .. 4 {
                    for x in 0 .. 4 {
                        assert_eq!(
                            tile.sample(channel, x, y).unwrap(),
                            reference.sample(channel, column * 4 + x, row * 4 + y).unwrap(),
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn whole_image_granularity_with_multiple_units() {
    // the plaintext is split at an arbitrary position not aligned to
    // tiles; both parts are compressed independently and concatenated
    let layout = tiled_rgb_layout();
    let plaintext = random_plaintext(&layout);
    let split = 40;

    let first = Compression::Zlib.compress(&plaintext[.. split]).unwrap();
    let second = Compression::Zlib.compress(&plaintext[split ..]).unwrap();

    let mut payload = first.clone();
    payload.extend_from_slice(&second);

    let table = CompressedUnitTable {
        method: Compression::Zlib,
        granularity: UnitGranularity::WholeImage,
        units: vec![
            CompressedUnit { offset: 0, size: first.len() as u64 },
            CompressedUnit { offset: first.len() as u64, size: second.len() as u64 },
        ],
    };

    let reference = decode_region(&layout, plaintext.as_slice(), None, DecodeRegion::FullImage).unwrap();
    let decoded = decode_region(&layout, payload.as_slice(), Some(&table), DecodeRegion::FullImage).unwrap();
    assert_eq!(decoded, reference);
}

#[test]
fn per_tile_units_roundtrip() {
    let layout = tiled_rgb_layout();

    // build planes by decoding random bytes, then re-encode compressed
    let plaintext = random_plaintext(&layout);
    let planes = decode_region(&layout, plaintext.as_slice(), None, DecodeRegion::FullImage).unwrap();

    let mut payload = Vec::new();
    let table = encode_image(&layout, &planes, &mut payload, Some(Compression::Zlib))
        .unwrap().expect("compressed encoding must produce a unit table");

    assert_eq!(table.granularity, UnitGranularity::PerTile);
    assert_eq!(table.units.len(), 4);
    assert_eq!(table.method, Compression::Zlib);

    // units are appended sequentially and contained in the payload
    let mut expected_offset = 0;
    for unit in &table.units {
        assert_eq!(unit.offset, expected_offset);
        expected_offset += unit.size;
    }
    assert_eq!(expected_offset, payload.len() as u64);

    let decoded = decode_region(&layout, payload.as_slice(), Some(&table), DecodeRegion::FullImage).unwrap();
    assert_eq!(decoded, planes);

    // single-tile access only needs that tile's unit
    let tile = decode_region(
        &layout, payload.as_slice(), Some(&table),
        DecodeRegion::Tile { column: 1, row: 1 },
    ).unwrap();

    for y in 0 .. 4 {
        for x in 0 .. 4 {
            assert_eq!(
                tile.sample(Channel::Red, x, y).unwrap(),
                planes.sample(Channel::Red, 4 + x, 4 + y).unwrap(),
            );
        }
    }
}

#[test]
fn store_units_keep_the_bytes() {
    let layout = tiled_rgb_layout();
    let plaintext = random_plaintext(&layout);
    let planes = decode_region(&layout, plaintext.as_slice(), None, DecodeRegion::FullImage).unwrap();

    let mut payload = Vec::new();
    let table = encode_image(&layout, &planes, &mut payload, Some(Compression::Store))
        .unwrap().unwrap();

    // stored units concatenate to the uncompressed payload
    assert_eq!(payload.len() as u64, total_payload_size(&layout).unwrap());

    let decoded = decode_region(&layout, payload.as_slice(), Some(&table), DecodeRegion::FullImage).unwrap();
    assert_eq!(decoded, planes);
}

#[cfg(feature = "brotli")]
#[test]
fn brotli_units_roundtrip() {
    let layout = tiled_rgb_layout();
    let plaintext = random_plaintext(&layout);
    let planes = decode_region(&layout, plaintext.as_slice(), None, DecodeRegion::FullImage).unwrap();

    let mut payload = Vec::new();
    let table = encode_image(&layout, &planes, &mut payload, Some(Compression::Brotli))
        .unwrap().unwrap();

    let decoded = decode_region(&layout, payload.as_slice(), Some(&table), DecodeRegion::FullImage).unwrap();
    assert_eq!(decoded, planes);
}

#[test]
fn malformed_units_fail_as_invalid() {
    let layout = tiled_rgb_layout();
    let plaintext = random_plaintext(&layout);

    let compressed = Compression::Zlib.compress(&plaintext).unwrap();
    let table = CompressedUnitTable::single_unit(Compression::Zlib, compressed.len() as u64);

    // flip bytes in the middle of the stream
    let mut corrupt = compressed.clone();
    let middle = corrupt.len() / 2;
    corrupt[middle] ^= 0xff;
    corrupt[middle + 1] ^= 0xff;

    let result = decode_region(&layout, corrupt.as_slice(), Some(&table), DecodeRegion::FullImage);
    assert!(result.is_err());
}

#[test]
fn unit_table_must_match_the_tile_count() {
    let layout = tiled_rgb_layout();
    let payload = vec![0_u8; 64];

    let table = CompressedUnitTable {
        method: Compression::Zlib,
        granularity: UnitGranularity::PerTile,
        units: vec![CompressedUnit { offset: 0, size: 64 }], // 4 tiles, 1 unit
    };

    let result = decode_region(&layout, payload.as_slice(), Some(&table), DecodeRegion::FullImage);
    assert!(matches!(result, Err(Error::Invalid(_))));
}

#[test]
fn units_outside_the_payload_are_rejected() {
    let layout = tiled_rgb_layout();
    let payload = vec![0_u8; 16];

    let table = CompressedUnitTable::single_unit(Compression::Zlib, 32);
    let result = decode_region(&layout, payload.as_slice(), Some(&table), DecodeRegion::FullImage);
    assert!(matches!(result, Err(Error::Invalid(_))));
}
