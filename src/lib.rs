
//! Decode and encode the tiled raw-pixel byte layouts of ISO/IEC 23001-17
//! "uncompressed" image payloads (the `unci` item codec of the HEIF family).
//!
//! This crate is a pure transform between a declared byte layout plus the
//! payload bytes on one side, and typed per-channel pixel planes on the
//! other. It does not parse container boxes and does not perform file I/O;
//! the container layer supplies a validated [`meta::LayoutDescription`] and
//! a [`tiles::ByteSource`], and receives an [`image::PlaneSet`].

#![forbid(unsafe_code)]

pub mod io;
pub mod math;
pub mod meta;
pub mod image;
pub mod compression;
pub mod layout;
pub mod tiles;
pub mod error;

#[macro_use]
extern crate smallvec;


pub mod prelude {
    //! Import this specific module with `use unci::prelude::*;`.
    //! This includes all the main types of this crate.

    // main data types
    pub use crate::meta::{LayoutDescription, LayoutParameters};
    pub use crate::meta::component::{
        Channel, Component, ComponentFormat, ComponentRole,
        Interleave, Profile, Sampling,
    };

    // decoding and encoding entry points
    pub use crate::tiles::{
        decode_region, decode_tile_component, encode_image,
        ByteSource, DecodeRegion, PayloadStore,
    };

    // pixel planes
    pub use crate::image::{Plane, PlaneSet, PlaneView, PlaneViewMut};

    // generic compression
    pub use crate::compression::{
        Compression, CompressedUnit, CompressedUnitTable, UnitGranularity,
    };

    // error handling
    pub use crate::error::{Error, Result, UnitResult};
}
