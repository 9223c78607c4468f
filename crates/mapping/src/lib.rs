//! Interpolation of fields between meshes
#![doc = include_str!("../readme.md")]

// Split into subfiles for development, but anything important is re-exported
mod error;
mod index;
mod interpolate;
mod mapper;
mod report;

#[doc(inline)]
pub use index::{distance_squared, Point, PointIndex};

#[doc(inline)]
pub use interpolate::{
    barycentric_2d, barycentric_3d, Geometry, Method, Stencil, CONTAINMENT_TOLERANCE,
    DEGENERATE_TOLERANCE, HULL_TOLERANCE, LINEAR_CANDIDATES, MAX_CANDIDATES,
};

#[doc(inline)]
pub use mapper::{map_field, map_field_2d, map_fields, Location, MapOptions, Mapper};

#[doc(inline)]
pub use report::{FieldReport, MappingReport, PROVENANCE_SUFFIX};

#[doc(inline)]
pub use error::{Error, Result};
