//! Geometry primitives.
//!
//! - [`Point`]: a fixed-dimension coordinate tuple
//! - [`Cuboid`]: an axis-aligned box, half-open on every axis
//! - [`Volume`]: a union of cuboids, the unit tested during classification

mod cuboid;
mod point;
mod volume;

pub use cuboid::Cuboid;
pub use point::Point;
pub use volume::Volume;
